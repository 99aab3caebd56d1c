use rst_common::standard::serde::de::DeserializeOwned;
use rst_common::standard::serde::Serialize;
use rst_common::standard::serde_json::{self, Value};

use super::types::PluginError;

/// `params` decodes raw method arguments into their typed form
pub fn params<T>(args: Value) -> Result<T, PluginError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(args).map_err(|err| PluginError::InvalidParams(err.to_string()))
}

/// `output` encodes a typed method result back into its raw form
pub fn output<T>(value: T) -> Result<Value, PluginError>
where
    T: Serialize,
{
    serde_json::to_value(value).map_err(|err| PluginError::JSONError(err.to_string()))
}
