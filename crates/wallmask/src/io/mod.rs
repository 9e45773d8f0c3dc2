pub mod geojson;

pub use self::geojson::{walls_from_geojson_str, walls_to_geojson, walls_to_typed_geojson};
