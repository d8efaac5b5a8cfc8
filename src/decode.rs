use crate::{
    wire::{self, Job, JsonRpcRequest, Lang, Params},
    Beam, Translation, TranslationRequest, TranslatorError,
};

/// Error code the service uses for "Too many requests."
pub const RATE_LIMIT_ERROR_CODE: i64 = 1_042_901;

pub(crate) fn build_jsonrpc_request(request: &TranslationRequest, id: u64) -> JsonRpcRequest {
    let source = request.source.rpc_code();
    let target = request.target.rpc_code();

    JsonRpcRequest {
        jsonrpc: wire::JSONRPC_VERSION,
        method: wire::HANDLE_JOBS_METHOD,
        id,
        params: Params {
            jobs: vec![Job {
                kind: "default",
                raw_en_sentence: request.text.clone(),
            }],
            lang: Lang {
                user_preferred_langs: vec![source.clone(), target.clone()],
                source_lang_user_selected: source,
                target_lang: target,
            },
        },
    }
}

pub(crate) fn decode_jsonrpc_response(body: &str) -> Result<Translation, TranslatorError> {
    let response = serde_json::from_str::<wire::JsonRpcResponse>(body).map_err(|err| {
        TranslatorError::Decode(format!("invalid JSON-RPC response: {err}; body: {body}"))
    })?;

    if let Some(error) = response.error {
        return Err(classify_rpc_error(error.code, error.message));
    }

    let result = response
        .result
        .ok_or_else(|| TranslatorError::Decode("response has neither result nor error".to_owned()))?;

    let beams: Vec<Beam> = result
        .translations
        .into_iter()
        .next()
        .ok_or_else(|| TranslatorError::Decode("response contains no translations".to_owned()))?
        .beams
        .into_iter()
        // Beams without a sentence are skipped, not fatal.
        .filter_map(|beam| {
            Some(Beam {
                text: beam.postprocessed_sentence?,
                score: beam.score,
                total_log_prob: beam.total_log_prob,
                num_symbols: beam.num_symbols,
            })
        })
        .collect();

    let text = beams
        .first()
        .map(|beam| beam.text.clone())
        .ok_or_else(|| TranslatorError::Decode("translation contains no beams".to_owned()))?;

    Ok(Translation {
        text,
        beams,
        source_lang: result.source_lang,
        target_lang: result.target_lang,
    })
}

/// Maps an error payload to `RateLimited` or `Service`.
pub(crate) fn classify_rpc_error(code: Option<i64>, message: Option<String>) -> TranslatorError {
    if is_rate_limit(code, message.as_deref()) {
        TranslatorError::RateLimited { code, message }
    } else {
        TranslatorError::Service { code, message }
    }
}

fn is_rate_limit(code: Option<i64>, message: Option<&str>) -> bool {
    if code == Some(RATE_LIMIT_ERROR_CODE) {
        return true;
    }
    message.is_some_and(|message| {
        message
            .trim()
            .trim_end_matches('.')
            .eq_ignore_ascii_case("too many requests")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SourceLanguage, TargetLanguage};
    use serde_json::json;

    #[test]
    fn request_matches_service_shape() {
        let request = TranslationRequest::new(
            "Hello",
            SourceLanguage::English,
            TargetLanguage::German,
        );
        let payload = serde_json::to_value(build_jsonrpc_request(&request, 7)).unwrap();

        assert_eq!(
            payload,
            json!({
                "jsonrpc": "2.0",
                "method": "LMT_handle_jobs",
                "id": 7,
                "params": {
                    "jobs": [{ "kind": "default", "raw_en_sentence": "Hello" }],
                    "lang": {
                        "user_preferred_langs": ["EN", "DE"],
                        "source_lang_user_selected": "EN",
                        "target_lang": "DE"
                    }
                }
            })
        );
    }

    #[test]
    fn beams_keep_ranking_metadata() {
        let body = json!({
            "result": {
                "source_lang": "EN",
                "target_lang": "DE",
                "translations": [{
                    "beams": [
                        { "postprocessed_sentence": "Hallo", "score": -0.5, "totalLogProb": -1.25, "num_symbols": 3 },
                        { "postprocessed_sentence": "Guten Tag" }
                    ]
                }]
            }
        })
        .to_string();

        let translation = decode_jsonrpc_response(&body).unwrap();
        assert_eq!(translation.text, "Hallo");
        assert_eq!(translation.beams.len(), 2);
        assert_eq!(translation.beams[0].score, Some(-0.5));
        assert_eq!(translation.beams[0].total_log_prob, Some(-1.25));
        assert_eq!(translation.beams[0].num_symbols, Some(3));
        assert_eq!(translation.beams[1].score, None);
        assert_eq!(translation.source_lang.as_deref(), Some("EN"));
    }

    #[test]
    fn beams_without_sentence_are_skipped() {
        let body = json!({
            "result": {
                "translations": [{
                    "beams": [
                        { "score": 1.0 },
                        { "postprocessed_sentence": "Hallo", "score": 0.5 }
                    ]
                }]
            }
        })
        .to_string();

        let translation = decode_jsonrpc_response(&body).unwrap();
        assert_eq!(translation.text, "Hallo");
        assert_eq!(translation.beams.len(), 1);
        assert_eq!(translation.beams[0].score, Some(0.5));

        let only_empty = json!({ "result": { "translations": [{ "beams": [{ "score": 1.0 }] }] } })
            .to_string();
        assert!(matches!(
            decode_jsonrpc_response(&only_empty),
            Err(TranslatorError::Decode(_))
        ));
    }

    #[test]
    fn rate_limit_is_recognized_by_code_or_message() {
        assert!(matches!(
            classify_rpc_error(Some(RATE_LIMIT_ERROR_CODE), None),
            TranslatorError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_rpc_error(None, Some("Too many requests.".to_owned())),
            TranslatorError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_rpc_error(Some(-32600), Some("Invalid Request".to_owned())),
            TranslatorError::Service { .. }
        ));
    }

    #[test]
    fn empty_or_malformed_results_are_decode_errors() {
        let no_beams = json!({ "result": { "translations": [{ "beams": [] }] } }).to_string();
        assert!(matches!(
            decode_jsonrpc_response(&no_beams),
            Err(TranslatorError::Decode(_))
        ));
        assert!(matches!(
            decode_jsonrpc_response("<html>"),
            Err(TranslatorError::Decode(_))
        ));
        assert!(matches!(
            decode_jsonrpc_response("{}"),
            Err(TranslatorError::Decode(_))
        ));
    }
}
