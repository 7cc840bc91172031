//! Language-model extraction adapters.
//!
//! Each adapter builds a prompt, sends it through a [`client::LanguageModel`], and turns
//! the reply into a typed result. Model output is untrusted free text: anything that does
//! not deserialise into the expected shape is treated as "nothing extracted" rather than
//! an error, so the interactive flow keeps moving. Transport failures are still errors.

pub mod client;
pub mod corrections;
pub mod daily;
pub mod topics;

use serde::de::DeserializeOwned;

/// Locates the outermost JSON value delimited by `open`/`close` in a model reply.
///
/// Replies often wrap the JSON in prose or a fenced code block; everything outside the
/// first `open` and the last `close` is ignored.
fn json_slice(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

/// Deserialises the JSON object or array embedded in `raw`, falling back to `T::default()`.
pub(crate) fn parse_lenient<T>(raw: &str, what: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let slice = json_slice(raw, '{', '}')
        .into_iter()
        .chain(json_slice(raw, '[', ']'))
        .find_map(|s| serde_json::from_str::<T>(s).ok());

    match slice {
        Some(value) => value,
        None => {
            tracing::warn!("could not parse {what} from model output; treating as empty");
            T::default()
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::client::LanguageModel;
    use crate::MinutesResult;
    use std::cell::RefCell;

    /// Returns a canned reply and remembers the prompts it was sent.
    pub struct CannedModel {
        reply: String,
        pub prompts: RefCell<Vec<String>>,
    }

    impl CannedModel {
        pub fn new(reply: impl Into<String>) -> Self {
            Self {
                reply: reply.into(),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl LanguageModel for CannedModel {
        fn model_name(&self) -> &str {
            "canned"
        }

        fn complete(&self, prompt: &str) -> MinutesResult<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, serde::Deserialize, PartialEq)]
    struct Probe {
        value: u32,
    }

    #[test]
    fn test_parse_lenient_skips_surrounding_prose() {
        let raw = "Sure! Here you go:\n```json\n{\"value\": 7}\n```\nAnything else?";
        assert_eq!(parse_lenient::<Probe>(raw, "probe"), Probe { value: 7 });
    }

    #[test]
    fn test_parse_lenient_falls_back_to_default() {
        assert_eq!(parse_lenient::<Probe>("no json here", "probe"), Probe::default());
        assert_eq!(parse_lenient::<Probe>("{\"value\": \"x\"}", "probe"), Probe::default());
    }

    #[test]
    fn test_parse_lenient_reads_arrays() {
        let parsed: Vec<u32> = parse_lenient("result: [1, 2, 3]", "numbers");
        assert_eq!(parsed, vec![1, 2, 3]);
    }
}
