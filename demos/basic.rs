use deepl_translator::{SourceLanguage, TargetLanguage, TranslationRequest, Translator};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let translator = Translator::from_env()?;

    // `basic "<text>" [source] [target]`, codes as in the translator URL.
    let mut args = std::env::args().skip(1);
    let text = args
        .next()
        .unwrap_or_else(|| "Hello, my name is Linus. And what's your name?".to_owned());
    let source = args.next().unwrap_or_else(|| SourceLanguage::English.code().to_owned());
    let target = args.next().unwrap_or_else(|| TargetLanguage::German.code().to_owned());

    let request = TranslationRequest::from_codes(text, &source, &target)?;
    let translation = translator.translate_request(&request).await?;

    println!("{}", translation.text);
    for (index, beam) in translation.beams.iter().enumerate().skip(1) {
        println!("  alternative {index}: {} (score {:?})", beam.text, beam.score);
    }

    translator.shutdown().await;
    Ok(())
}
