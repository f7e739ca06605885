/// JSONの`null`を型のデフォルト値として読み込むデシリアライザ
///
/// `#[serde(default)]`はキーが存在しない場合のみ適用されるため、
/// `null`も空文字列・falseと同じに扱うフィールドで併用する。
use serde::{Deserialize, Deserializer};

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
        #[serde(default, deserialize_with = "null_as_default")]
        flag: bool,
    }

    #[test]
    fn test_null_becomes_default() {
        let sample: Sample = serde_json::from_str(r#"{"text": null, "flag": null}"#).unwrap();
        assert_eq!(sample.text, "");
        assert!(!sample.flag);
    }

    #[test]
    fn test_absent_becomes_default() {
        let sample: Sample = serde_json::from_str("{}").unwrap();
        assert_eq!(sample.text, "");
        assert!(!sample.flag);
    }

    #[test]
    fn test_present_value_is_kept() {
        let sample: Sample = serde_json::from_str(r#"{"text": "abc", "flag": true}"#).unwrap();
        assert_eq!(sample.text, "abc");
        assert!(sample.flag);
    }

    #[test]
    fn test_wrong_type_is_still_an_error() {
        let result = serde_json::from_str::<Sample>(r#"{"flag": "yes"}"#);
        assert!(result.is_err());
    }
}
