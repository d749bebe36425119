use lingopane_core::{
    JsonFileStore, LoopbackTransport, PageDirective, Paths, SettingsStore, TabId,
};
use lingopane_dispatcher::{Dispatcher, DispatcherConfig, EndpointClient};
use tokio::sync::mpsc;

/// One-shot translation through the real pipeline: settings file,
/// dispatcher, endpoint call, directive back over a loopback transport.
pub async fn run(text: &str, target_language: Option<&str>) -> anyhow::Result<()> {
    let store = JsonFileStore::new(Paths::new());
    let settings = store.load().await?;

    let (directive_tx, mut directive_rx) = mpsc::channel(4);
    let dispatcher = Dispatcher::new(
        DispatcherConfig::from_settings(&settings),
        EndpointClient::new(None, None),
        LoopbackTransport::new(directive_tx),
    );

    dispatcher
        .handle_translation_request(text, target_language, TabId(0))
        .await;

    match directive_rx.recv().await {
        Some(PageDirective::ShowTranslation {
            original,
            translation,
            detected_language,
        }) => {
            print_result(&original, &translation, detected_language.as_deref(), None);
        }
        Some(PageDirective::ShowEnhancedTranslation {
            original, result, ..
        }) => {
            print_result(
                &original,
                &result.translation,
                result.detected_language.as_deref(),
                result.meanings.as_ref(),
            );
        }
        Some(PageDirective::ShowError { error }) => {
            anyhow::bail!(error);
        }
        other => anyhow::bail!("no result delivered: {:?}", other),
    }

    Ok(())
}

fn print_result(
    original: &str,
    translation: &str,
    detected_language: Option<&str>,
    meanings: Option<&std::collections::BTreeMap<String, lingopane_core::Meaning>>,
) {
    println!("Original:    {}", original);
    if let Some(lang) = detected_language {
        println!("Detected:    {}", lang);
    }
    println!("Translation: {}", translation);
    if let Some(meanings) = meanings {
        println!();
        println!("Meanings:");
        for (word, meaning) in meanings {
            match &meaning.localized {
                Some(localized) => {
                    println!("  {}: {} ({})", word, meaning.english, localized)
                }
                None => println!("  {}: {}", word, meaning.english),
            }
        }
    }
}
