use lingopane_core::{Paths, Settings};

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!("lingopane status");
    println!("================");
    println!();

    let settings_path = paths.settings_file();
    let exists = settings_path.exists();
    println!(
        "Settings:  {} {}",
        settings_path.display(),
        if exists { "✓" } else { "✗ (defaults)" }
    );

    let settings = if exists {
        Settings::load(&settings_path)?
    } else {
        Settings::default()
    };

    println!(
        "API key:   {}",
        if settings.has_credential() {
            "configured"
        } else {
            "not set (run `lingopane config set geminiApiKey <key>`)"
        }
    );
    println!("Target:    {}", settings.target_language);
    println!();
    println!("Features:");
    println!("  meanings: {}", settings.show_meanings);
    println!("  synonyms: {}", settings.show_synonyms);
    println!("  examples: {}", settings.show_examples);
    println!();
    println!(
        "Hotkey:    {}+{} ({}{})",
        settings.hotkey_modifier,
        settings.hotkey_key,
        if settings.hotkeys_enabled {
            "enabled"
        } else {
            "disabled"
        },
        if settings.hotkey_only {
            ", hotkey-only"
        } else {
            ""
        }
    );

    Ok(())
}
