use std::collections::HashMap;
use anyhow::anyhow;
use fluent::FluentArgs;
use include_dir::{include_dir, Dir};
use crate::localization::{Error, FluentBundle};

const LOCALES: Dir = include_dir!("$CARGO_MANIFEST_DIR/locales/discord");

pub fn load_discord_locales(fallback: &str) -> Result<Locales, Error> {
    let mut bundles = HashMap::new();

    for file in LOCALES.files() {
        let locale = file.path()
            .file_stem().ok_or(anyhow!("Invalid file name: '{}'", file.path().display()))?
            .to_str().ok_or(anyhow!("Invalid unicode filename"))?;

        let resource = fluent::FluentResource::try_new(file.contents_utf8().ok_or(anyhow!("Invalid file contents"))?.to_owned())
            .map_err(|(_, e)| anyhow!("failed to parse {:?}: {:?}", file.path(), e))?;

        let mut bundle = FluentBundle::new_concurrent(vec![locale
            .parse()
            .map_err(|e| anyhow!("invalid locale `{}`: {}", locale, e))?]);
        // replies are plain chat text, unicode isolation marks only get in the way
        bundle.set_use_isolating(false);
        bundle
            .add_resource(resource)
            .map_err(|e| anyhow!("failed to add resource to bundle: {:?}", e))?;

        bundles.insert(locale.to_owned(), bundle);
    }

    Locales::new_with_bundles(fallback.to_string(), bundles)
}

pub struct Locales {
    fallback: String,
    bundles: HashMap<String, FluentBundle>,
}

impl Locales {
    pub fn new_with_bundles(fallback: String, bundles: HashMap<String, FluentBundle>) -> Result<Self, Error> {
        if !bundles.contains_key(&fallback) {
            return Err(anyhow!("fallback locale {} not found", fallback));
        }

        Ok(Self { fallback, bundles })
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Resolves a localized message by searching through a cascading locale chain.
    ///
    /// For a given locale (e.g., "ja-JP") and a defined fallback (e.g., "en-US"),
    /// the search candidates are prioritized as: ["ja-JP", "ja", "en-US"].
    /// With `attribute` set, the message attribute is formatted instead of its value.
    pub fn resolve(&self, locale: &str, id: &str, attribute: Option<&str>, args: Option<&FluentArgs>) -> Result<String, Error> {
        let mut candidates = vec![locale];
        if let Some((language, _)) = locale.split_once('-') {
            candidates.push(language);
        }
        if !candidates.contains(&self.fallback.as_str()) {
            candidates.push(self.fallback.as_str());
        }

        for candidate in candidates {
            if let Some(formatted) = self.bundles.get(candidate).and_then(|bundle| format(bundle, id, attribute, args)) {
                return Ok(formatted);
            }
        }

        Err(anyhow!("no fallback found for id '{}' (attribute {:?})", id, attribute))
    }

    /// Fills name and description localizations of every command and its
    /// parameters. Messages are keyed by command name; parameters use the
    /// attributes `<param>` and `<param>-description`.
    pub fn apply<U, E>(&self, commands: &mut [poise::Command<U, E>]) -> Result<(), Error> {
        let fallback = self.bundles.get(&self.fallback)
            .ok_or(anyhow!("fallback locale {} not found", self.fallback))?;

        for command in commands.iter_mut() {
            for (locale, bundle) in &self.bundles {
                let Some(name) = format(bundle, &command.name, None, None) else {
                    continue; // command not translated for this locale
                };

                command.name_localizations.insert(locale.clone(), name);
                if let Some(description) = format(bundle, &command.name, Some("description"), None) {
                    command.description_localizations.insert(locale.clone(), description);
                }

                for parameter in &mut command.parameters {
                    if let Some(name) = format(bundle, &command.name, Some(&parameter.name), None) {
                        parameter.name_localizations.insert(locale.clone(), name);
                    }
                    if let Some(description) = format(bundle, &command.name, Some(&format!("{}-description", parameter.name)), None) {
                        parameter.description_localizations.insert(locale.clone(), description);
                    }
                }
            }

            if let Some(description) = format(fallback, &command.name, Some("description"), None) {
                command.description = Some(description);
            }
            for parameter in &mut command.parameters {
                if let Some(description) = format(fallback, &command.name, Some(&format!("{}-description", parameter.name)), None) {
                    parameter.description = Some(description);
                }
            }
        }

        Ok(())
    }
}

fn format(bundle: &FluentBundle, id: &str, attribute: Option<&str>, args: Option<&FluentArgs>) -> Option<String> {
    let message = bundle.get_message(id)?;
    let pattern = match attribute {
        Some(attribute) => message.get_attribute(attribute)?.value(),
        None => message.value()?,
    };
    let formatted = bundle.format_pattern(pattern, args, &mut vec![]);
    Some(formatted.into_owned())
}
