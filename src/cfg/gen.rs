//! Code generation for typed config documents.
//!
//! Each section becomes a plain struct of [`Value`] fields with their defaults
//! parsed from the same text a user would write in the file, so a default can
//! never be something the parser would reject.

use super::{
    error::Error,
    parse::{most_similar, SetError, Value},
    scanner::Scanner,
};

/// Parses the default of `section.field`. Defaults are literals in the
/// source, an invalid one is a bug.
pub fn default_value<T: Value>(section: &str, field: &str, text: &str) -> T {
    let text = format!("{text}\n");
    match T::parse(&mut Scanner::new(&text)) {
        Ok(value) => value,
        Err(error) => panic!("invalid default for {section}.{field}: {error}"),
    }
}

pub fn unknown_field(section: &str, field: &str, fields: &[&'static str]) -> SetError {
    let error = Error::new(format!("no field `{field}` in section `{section}`"));
    SetError::InvalidKey(with_hint(error, "field", field, fields))
}

pub fn unknown_section(path: &str, sections: &[&'static str]) -> Error {
    with_hint(Error::new(format!("no such section: `{path}`")), "section", path, sections)
}

fn with_hint(error: Error, what: &str, name: &str, valid: &[&'static str]) -> Error {
    match most_similar(name, valid.iter().copied()) {
        // The parser moves the label onto the offending name.
        Some(similar) => error.with_label(
            0..0,
            format!("help: a {what} with a similar name exists: `{similar}`"),
        ),
        None => error,
    }
}

macro_rules! _def_section {
    ($path:literal, $type_name:ident { $($field:ident: $type:ty = $default:literal,)* }) => {
        pub struct $type_name {
            $(pub $field: $type,)*
        }

        impl $type_name {
            const FIELD_NAMES: &'static [&'static str] = &[$(std::stringify!($field),)*];
        }

        impl std::default::Default for $type_name {
            fn default() -> Self {
                Self {
                    $(
                        $field: crate::cfg::gen::default_value(
                            $path,
                            std::stringify!($field),
                            $default,
                        ),
                    )*
                }
            }
        }

        impl crate::cfg::parse::Section for $type_name {
            fn set(
                &mut self,
                section_name: &str,
                field: &str,
                scanner: &mut crate::cfg::scanner::Scanner,
            ) -> crate::cfg::parse::SetResult {
                use crate::cfg::parse::{SetError, Value};
                match field {
                    $(
                        std::stringify!($field) => {
                            self.$field = <$type>::parse(scanner).map_err(SetError::InvalidValue)?
                        }
                    )*
                    _ => {
                        return Err(crate::cfg::gen::unknown_field(
                            section_name,
                            field,
                            Self::FIELD_NAMES,
                        ))
                    }
                }
                Ok(())
            }

            fn get(&self, field: &str) -> Option<String> {
                use crate::cfg::parse::Value;
                match field {
                    $(std::stringify!($field) => Some(self.$field.to_text()),)*
                    _ => None,
                }
            }

            fn field_names(&self) -> &'static [&'static str] {
                Self::FIELD_NAMES
            }
        }
    };
}

/// Defines the section structs and a `ParsedConfig` holding one of each,
/// which implements [`Document`](super::parse::Document).
///
/// ```ignore
/// parsed_config! {
///     // `[controls]` in the file, `config.controls` of type `ControlsSection`.
///     controls: ControlsSection => "controls" {
///         // The default is parsed like a value in the file.
///         debounce_ms: u64 = "100",
///     }
/// }
/// ```
macro_rules! parsed_config {
    {
        $(
            $ident:ident: $type_name:ident => $path:literal { $($fields:tt)* }
        )*
    } => {
        $(crate::cfg::gen::_def_section!($path, $type_name { $($fields)* });)*

        #[derive(Default)]
        pub struct ParsedConfig {
            $(pub $ident: $type_name,)*
        }

        impl ParsedConfig {
            const SECTION_NAMES: &'static [&'static str] = &[$($path,)*];
        }

        impl crate::cfg::parse::Document for ParsedConfig {
            fn section(
                &mut self,
                path: &str,
            ) -> Result<&mut dyn crate::cfg::parse::Section, crate::cfg::error::Error> {
                match path {
                    $($path => Ok(&mut self.$ident),)*
                    _ => Err(crate::cfg::gen::unknown_section(path, Self::SECTION_NAMES)),
                }
            }

            fn lookup(&self, key: &str) -> Option<String> {
                use crate::cfg::parse::Section;
                let (section, field) = key.rsplit_once('.')?;
                match section {
                    $($path => self.$ident.get(field),)*
                    _ => None,
                }
            }

            fn keys(&self) -> Vec<String> {
                use crate::cfg::parse::Section;
                let mut keys = Vec::new();
                $(
                    keys.extend(
                        self.$ident.field_names().iter().map(|field| format!("{}.{field}", $path)),
                    );
                )*
                keys
            }
        }
    };
}

pub(crate) use _def_section;
pub(crate) use parsed_config;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_like_file_values() {
        assert_eq!(default_value::<u64>("controls", "debounce_ms", "100"), 100);
        assert_eq!(default_value::<String>("log", "level", "'info'"), "info");
    }

    #[test]
    #[should_panic(expected = "invalid default for controls.scroll_step")]
    fn invalid_default_is_a_bug() {
        default_value::<f64>("controls", "scroll_step", "five");
    }

    #[test]
    fn unknown_names_get_a_hint() {
        let fields = &["debounce_ms", "scroll_step"];
        match unknown_field("controls", "scrol_step", fields) {
            SetError::InvalidKey(error) => {
                assert_eq!(error.message(), "no field `scrol_step` in section `controls`")
            }
            SetError::InvalidValue(_) => panic!("expected a key error"),
        }
        let error = unknown_section("brightnes", &["audio", "brightness"]);
        assert_eq!(error.message(), "no such section: `brightnes`");
        assert!(error.to_string().contains("`brightness`"));
    }
}
