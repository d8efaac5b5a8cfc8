use std::time::Duration;

use deepl_translator::{
    ClientOptions, FailureKind, Repetitions, SourceLanguage, TargetLanguage, Translator,
};

/// Live tests hit the public service and only run when `DEEPL_LIVE_TESTS=1`.
fn live_tests_enabled() -> bool {
    std::env::var("DEEPL_LIVE_TESTS").is_ok_and(|value| value == "1")
}

fn live_translator() -> Translator {
    let options = ClientOptions::new(
        Duration::from_secs(15),
        Repetitions::Limited(2),
        |retry| Duration::from_millis(3_000 + 5_000 * u64::from(retry)),
        true,
    )
    .expect("options must be valid");

    if std::env::var("DEEPL_JSONRPC_URL").is_ok() {
        Translator::from_env().expect("environment configuration must be valid")
    } else {
        Translator::json_rpc(options)
    }
}

#[tokio::test]
async fn live_translation_roundtrip() {
    if !live_tests_enabled() {
        eprintln!("skipping live test: set DEEPL_LIVE_TESTS=1 to run");
        return;
    }

    let translator = live_translator();
    let outcome = translator
        .translate(
            "We speak English here.",
            SourceLanguage::English,
            TargetLanguage::German,
        )
        .await;

    match outcome {
        Ok(translation) => {
            assert!(!translation.text.trim().is_empty());
            assert!(!translation.beams.is_empty());
        }
        // The public endpoint throttles anonymous clients aggressively.
        Err(err) if err.kind() == FailureKind::RateLimited => {
            eprintln!("live service rate limited the test client: {err}");
        }
        Err(err) => panic!("live translation failed: {err}"),
    }

    translator.shutdown().await;
}
