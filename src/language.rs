//! Languages offered by the DeepL translator.
//!
//! Both sets are closed enums; the code lookup tables are built once on
//! first use.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::TranslatorError;

macro_rules! language_table {
    (
        $(#[$meta:meta])*
        $name:ident, $table:ident {
            $($variant:ident => ($code:literal, $attribute:literal),)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum $name {
            $($variant,)+
        }

        static $table: Lazy<HashMap<String, $name>> = Lazy::new(|| {
            $name::ALL
                .iter()
                .map(|language| (language.code().to_ascii_lowercase(), *language))
                .collect()
        });

        impl $name {
            /// Every language of this set, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Language code used in translator URLs.
            pub fn code(self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            /// Value of the `dl-test` attribute of the matching option in the web UI.
            pub fn attribute_value(self) -> &'static str {
                match self {
                    $($name::$variant => $attribute,)+
                }
            }

            /// Looks up a language by code, ignoring ASCII case.
            pub fn from_code(code: &str) -> Option<Self> {
                $table.get(&code.trim().to_ascii_lowercase()).copied()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl FromStr for $name {
            type Err = TranslatorError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_code(s).ok_or_else(|| {
                    TranslatorError::Validation(format!(
                        concat!("unknown ", stringify!($name), " code '{}'"),
                        s
                    ))
                })
            }
        }
    };
}

language_table! {
    /// Language of the text to translate.
    SourceLanguage, SOURCE_BY_CODE {
        AutoDetect => ("auto", "translator-lang-option-auto"),
        Bulgarian => ("bg", "translator-lang-option-bg"),
        Chinese => ("zh", "translator-lang-option-zh"),
        Czech => ("cs", "translator-lang-option-cs"),
        Danish => ("da", "translator-lang-option-da"),
        Dutch => ("nl", "translator-lang-option-nl"),
        English => ("en", "translator-lang-option-en"),
        Estonian => ("et", "translator-lang-option-et"),
        Finnish => ("fi", "translator-lang-option-fi"),
        French => ("fr", "translator-lang-option-fr"),
        German => ("de", "translator-lang-option-de"),
        Greek => ("el", "translator-lang-option-el"),
        Hungarian => ("hu", "translator-lang-option-hu"),
        Indonesian => ("id", "translator-lang-option-id"),
        Italian => ("it", "translator-lang-option-it"),
        Japanese => ("ja", "translator-lang-option-ja"),
        Korean => ("ko", "translator-lang-option-ko"),
        Latvian => ("lv", "translator-lang-option-lv"),
        Lithuanian => ("lt", "translator-lang-option-lt"),
        Norwegian => ("nb", "translator-lang-option-nb"),
        Polish => ("pl", "translator-lang-option-pl"),
        Portuguese => ("pt", "translator-lang-option-pt"),
        Romanian => ("ro", "translator-lang-option-ro"),
        Russian => ("ru", "translator-lang-option-ru"),
        Slovak => ("sk", "translator-lang-option-sk"),
        Slovenian => ("sl", "translator-lang-option-sl"),
        Spanish => ("es", "translator-lang-option-es"),
        Swedish => ("sv", "translator-lang-option-sv"),
        Turkish => ("tr", "translator-lang-option-tr"),
        Ukrainian => ("uk", "translator-lang-option-uk"),
    }
}

language_table! {
    /// Language to translate into.
    TargetLanguage, TARGET_BY_CODE {
        Bulgarian => ("bg-BG", "translator-lang-option-bg"),
        ChineseSimplified => ("zh-ZH", "translator-lang-option-zh"),
        Czech => ("cs-CS", "translator-lang-option-cs"),
        Danish => ("da-DA", "translator-lang-option-da"),
        Dutch => ("nl-NL", "translator-lang-option-nl"),
        EnglishAmerican => ("en-US", "translator-lang-option-en-US"),
        EnglishBritish => ("en-GB", "translator-lang-option-en-GB"),
        Estonian => ("et-ET", "translator-lang-option-et"),
        Finnish => ("fi-FI", "translator-lang-option-fi"),
        French => ("fr-FR", "translator-lang-option-fr"),
        German => ("de-DE", "translator-lang-option-de"),
        Greek => ("el-EL", "translator-lang-option-el"),
        Hungarian => ("hu-HU", "translator-lang-option-hu"),
        Italian => ("it-IT", "translator-lang-option-it"),
        Japanese => ("ja-JA", "translator-lang-option-ja"),
        Latvian => ("lv-LV", "translator-lang-option-lv"),
        Lithuanian => ("lt-LT", "translator-lang-option-lt"),
        Polish => ("pl-PL", "translator-lang-option-pl"),
        Portuguese => ("pt-PT", "translator-lang-option-pt-PT"),
        PortugueseBrazilian => ("pt-BR", "translator-lang-option-pt-BR"),
        Romanian => ("ro-RO", "translator-lang-option-ro"),
        Russian => ("ru-RU", "translator-lang-option-ru"),
        Slovak => ("sk-SK", "translator-lang-option-sk"),
        Slovenian => ("sl-SL", "translator-lang-option-sl"),
        Spanish => ("es-ES", "translator-lang-option-es"),
        Swedish => ("sv-SV", "translator-lang-option-sv"),
    }
}

impl SourceLanguage {
    /// Code sent to the JSON-RPC endpoint (`"EN"`, or `"auto"`).
    pub fn rpc_code(self) -> String {
        match self {
            Self::AutoDetect => self.code().to_owned(),
            other => other.code().to_ascii_uppercase(),
        }
    }
}

impl TargetLanguage {
    /// Primary language subtag, e.g. `"de"` for `de-DE`.
    pub fn primary_code(self) -> &'static str {
        let code = self.code();
        code.split_once('-').map_or(code, |(primary, _)| primary)
    }

    /// Code sent to the JSON-RPC endpoint.
    ///
    /// Regional variants the service distinguishes keep their region
    /// (`"EN-GB"`, `"PT-BR"`); every other language uses its primary subtag.
    pub fn rpc_code(self) -> String {
        match self {
            Self::EnglishAmerican
            | Self::EnglishBritish
            | Self::Portuguese
            | Self::PortugueseBrazilian => self.code().to_ascii_uppercase(),
            other => other.primary_code().to_ascii_uppercase(),
        }
    }
}
