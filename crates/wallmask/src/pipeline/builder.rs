use crate::{
    algorithms::{
        DetectorKind, DouglasPeuckerSimplifier, MorphologicalClose, MorphologicalOpen,
        RadialDecimation, ThresholdPreprocessor,
    },
    config::DetectionConfig,
    pipeline::DetectionPipeline,
    traits::{BoundaryDetector, ImagePreprocessor, OutlineSimplifier},
};

/// Builder for detection pipelines with a fluent API
pub struct DetectionPipelineBuilder {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    detector: Option<Box<dyn BoundaryDetector>>,
    postprocessors: Vec<Box<dyn OutlineSimplifier>>,
    config: DetectionConfig,
    multi_wall: bool,
}

impl DetectionPipelineBuilder {
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
            detector: None,
            postprocessors: Vec::new(),
            config: DetectionConfig::default(),
            multi_wall: false,
        }
    }

    /// Start from a detection config. The strategy it names is used unless
    /// a detector is set explicitly.
    pub fn from_config(config: &DetectionConfig) -> Self {
        let builder = Self {
            config: config.clone(),
            ..Self::new()
        };
        match config.simplify_tolerance {
            Some(tolerance) => builder.with_simplification(tolerance),
            None => builder,
        }
    }

    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Set the boundary detector (replaces any existing one)
    pub fn set_detector<D>(mut self, detector: D) -> Self
    where
        D: BoundaryDetector + 'static,
    {
        self.detector = Some(Box::new(detector));
        self
    }

    /// Select a built-in strategy, parameterised by the builder's config
    pub fn set_strategy(mut self, kind: DetectorKind) -> Self {
        self.config.strategy = kind;
        self.detector = None;
        self
    }

    pub fn add_postprocessor<P>(mut self, postprocessor: P) -> Self
    where
        P: OutlineSimplifier + 'static,
    {
        self.postprocessors.push(Box::new(postprocessor));
        self
    }

    /// Add Douglas-Peucker simplification as a post-processing step
    pub fn with_simplification(self, tolerance: f32) -> Self {
        self.add_postprocessor(DouglasPeuckerSimplifier { tolerance })
    }

    pub fn with_radial_decimation(self, tolerance: f32) -> Self {
        self.add_postprocessor(RadialDecimation { tolerance })
    }

    /// Close pin holes then drop speckles before extraction
    pub fn with_cleanup(self, close_radius: u8, open_radius: u8) -> Self {
        self.add_preprocessor(MorphologicalClose {
            radius: close_radius,
        })
        .add_preprocessor(MorphologicalOpen {
            radius: open_radius,
        })
    }

    pub fn min_wall_fraction(mut self, fraction: f32) -> Self {
        self.config.min_wall_fraction = fraction;
        self
    }

    /// Report each connected wall region separately
    pub fn multi_wall(mut self, enabled: bool) -> Self {
        self.multi_wall = enabled;
        self
    }

    pub fn build(self) -> DetectionPipeline {
        let detector = self
            .detector
            .unwrap_or_else(|| self.config.strategy.build(&self.config));

        DetectionPipeline::new(
            self.preprocessors,
            detector,
            self.postprocessors,
            self.config.min_wall_fraction,
            self.multi_wall,
            self.config.min_component_fraction,
        )
    }

    /// Pipeline for soft probability masks: threshold, then cleanup
    pub fn build_for_probability_mask(threshold: u8, config: &DetectionConfig) -> DetectionPipeline {
        Self::from_config(config)
            .add_preprocessor(ThresholdPreprocessor { threshold })
            .with_cleanup(2, 1)
            .build()
    }
}

impl Default for DetectionPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::WallMap;

    #[test]
    fn config_strategy_is_used() {
        let config = DetectionConfig {
            strategy: DetectorKind::MooreTrace,
            ..DetectionConfig::default()
        };
        let pipeline = DetectionPipelineBuilder::from_config(&config).build();
        assert!(pipeline.info().contains("moore_trace"));
    }

    #[test]
    fn cleanup_survives_speckled_wall() {
        let map = WallMap::from_fn(128, 128, |x, y| {
            let wall = (20..110).contains(&x) && (10..120).contains(&y);
            let hole = x % 17 == 0 && y % 13 == 0;
            wall && !hole
        });
        let pipeline = DetectionPipelineBuilder::new()
            .with_cleanup(1, 1)
            .set_strategy(DetectorKind::MooreTrace)
            .with_simplification(1.0)
            .build();
        let result = pipeline.process(&map, (256, 256)).unwrap();
        let wall = result.primary().unwrap();
        assert!(wall.points.len() >= 4);
        assert!(wall.points.len() <= 12);
    }
}
