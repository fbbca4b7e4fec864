// JSON adapter
//
// `decode` turns `serde_json::Value` documents into typed values, `encode`
// maps typed schemas and values back out as JSON schema documents and JSON.

pub use self::decode::{from_json, struct_from_json, DecodeConfig};
pub use self::encode::{to_json, JsonMapper};

pub mod decode;
pub mod encode;
