use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};

use crate::common::types::CommonError;

/// `Param` is the rpc payload of any agent method
///
/// `args` is given as is to the agent method, `metadata` is exposed to the
/// plugins through their execution context
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Param {
    #[serde(default)]
    pub args: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl TryFrom<Value> for Param {
    type Error = CommonError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if value.is_null() {
            return Ok(Param::default());
        }

        serde_json::from_value(value).map_err(|err| CommonError::JSONError(err.to_string()))
    }
}
