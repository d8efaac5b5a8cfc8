use std::time::Duration;

use deepl_translator::{ClientOptions, Repetitions, SourceLanguage, TargetLanguage, Translator};
use tokio::sync::mpsc;

const SENTENCES: &[&str] = &[
    "We speak English here.",
    "There were thousands of English soldiers in Boston.",
    "She was silent for a few moments in anger.",
    "I ran into a similar problem yesterday.",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let options = ClientOptions::new(
        Duration::from_secs(10),
        Repetitions::Limited(2),
        |retry| Duration::from_secs(3 + 5 * u64::from(retry)),
        true,
    )?;
    let translator = Translator::json_rpc(options).with_max_workers(2);

    let (tx, mut rx) = mpsc::unbounded_channel();
    for sentence in SENTENCES {
        let tx = tx.clone();
        let original = sentence.to_string();
        translator.translate_with_callback(
            *sentence,
            SourceLanguage::English,
            TargetLanguage::German,
            move |outcome| {
                let _ = tx.send((original, outcome));
            },
        )?;
    }
    drop(tx);

    while let Some((original, outcome)) = rx.recv().await {
        match outcome {
            Ok(translation) => println!("{original}\n  -> {}", translation.text),
            Err(err) => eprintln!("{original}\n  !! {err}"),
        }
    }

    translator.shutdown().await;
    Ok(())
}
