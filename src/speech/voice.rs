// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Voice profiles and the voice fallback chain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Voice, VoiceGender};

/// Name fragments of voices known to be female (lowercase)
const FEMALE_HINTS: &[&str] = &[
    "female", "женский", "mujer", "paulina", "mónica", "milena", "kore", "zephyr", "alena",
    "google",
];

/// Name fragments of voices known to be male (lowercase)
const MALE_HINTS: &[&str] = &["male", "мужской", "hombre", "puck", "charon", "yuri"];

/// Guess a voice's gender from its name.
///
/// Female hints win, so "Female" is not mistaken for "male".
pub fn infer_gender(name: &str) -> Option<VoiceGender> {
    let name = name.to_lowercase();
    if FEMALE_HINTS.iter().any(|hint| name.contains(hint)) {
        Some(VoiceGender::Female)
    } else if MALE_HINTS.iter().any(|hint| name.contains(hint)) {
        Some(VoiceGender::Male)
    } else {
        None
    }
}

/// Map a language name or two-letter code to a lowercase code
pub fn language_code(name: &str) -> Option<String> {
    let name = name.trim().to_lowercase();
    let code = match name.as_str() {
        "spanish" | "español" | "espanol" => "es",
        "russian" | "русский" => "ru",
        "english" => "en",
        _ if name.len() == 2 && name.chars().all(|c| c.is_ascii_alphabetic()) => {
            return Some(name);
        }
        _ => return None,
    };
    Some(code.to_string())
}

/// Full language tag to request when no voice could be selected
pub fn language_tag(code: &str) -> String {
    match code {
        "es" => "es-ES".to_string(),
        "ru" => "ru-RU".to_string(),
        "en" => "en-US".to_string(),
        other => other.to_string(),
    }
}

/// Requested voice: a language and a gender, written as `spanish-female`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoiceProfile {
    language: String,
    gender: VoiceGender,
}

impl VoiceProfile {
    pub fn new(language: &str, gender: VoiceGender) -> Result<Self, ParseProfileError> {
        let language =
            language_code(language).ok_or_else(|| ParseProfileError::Language(language.to_string()))?;
        Ok(Self { language, gender })
    }

    /// Two-letter language code
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn gender(&self) -> VoiceGender {
        self.gender
    }
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            language: "es".to_string(),
            gender: VoiceGender::Female,
        }
    }
}

/// Error parsing a voice profile key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseProfileError {
    #[error("voice profile '{0}' must look like 'spanish-female'")]
    Format(String),
    #[error("unknown voice language '{0}'")]
    Language(String),
    #[error("unknown voice gender '{0}'")]
    Gender(String),
}

impl FromStr for VoiceProfile {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (language, gender) = s
            .split_once('-')
            .ok_or_else(|| ParseProfileError::Format(s.to_string()))?;

        let gender = match gender.trim().to_lowercase().as_str() {
            "female" | "f" => VoiceGender::Female,
            "male" | "m" => VoiceGender::Male,
            other => return Err(ParseProfileError::Gender(other.to_string())),
        };

        Self::new(language, gender)
    }
}

impl TryFrom<String> for VoiceProfile {
    type Error = ParseProfileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VoiceProfile> for String {
    fn from(profile: VoiceProfile) -> Self {
        profile.to_string()
    }
}

impl fmt::Display for VoiceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gender = match self.gender {
            VoiceGender::Female => "female",
            VoiceGender::Male => "male",
        };
        write!(f, "{}-{}", self.language, gender)
    }
}

/// Pick a voice for `profile`, loosening the criteria until one matches:
///
/// 1. requested language and gender
/// 2. requested language
/// 3. female voice in the fallback language
/// 4. any voice in the fallback language
///
/// Returns `None` when nothing matches.
pub fn select_voice<'a>(
    voices: &'a [Voice],
    profile: &VoiceProfile,
    fallback_language: &str,
) -> Option<&'a Voice> {
    let checks: [&dyn Fn(&Voice) -> bool; 4] = [
        &|v: &Voice| v.speaks(profile.language()) && v.effective_gender() == Some(profile.gender()),
        &|v: &Voice| v.speaks(profile.language()),
        &|v: &Voice| v.speaks(fallback_language) && v.effective_gender() == Some(VoiceGender::Female),
        &|v: &Voice| v.speaks(fallback_language),
    ];

    checks
        .iter()
        .find_map(|check| voices.iter().find(|v| check(v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> Vec<Voice> {
        vec![
            Voice::new("Yuri", "ru-RU", None),
            Voice::new("Milena", "ru-RU", None),
            Voice::new("Jorge", "es-ES", Some(VoiceGender::Male)),
            Voice::new("Paulina", "es-MX", None),
            Voice::new("Daniel", "en-GB", Some(VoiceGender::Male)),
        ]
    }

    #[test]
    fn test_parse_profile() {
        let profile: VoiceProfile = "spanish-female".parse().unwrap();
        assert_eq!(profile.language(), "es");
        assert_eq!(profile.gender(), VoiceGender::Female);

        let profile: VoiceProfile = "ru-male".parse().unwrap();
        assert_eq!(profile.language(), "ru");
        assert_eq!(profile.gender(), VoiceGender::Male);
        assert_eq!(profile.to_string(), "ru-male");
    }

    #[test]
    fn test_parse_profile_errors() {
        assert!(matches!(
            "spanish".parse::<VoiceProfile>(),
            Err(ParseProfileError::Format(_))
        ));
        assert!(matches!(
            "klingon-female".parse::<VoiceProfile>(),
            Err(ParseProfileError::Language(_))
        ));
        assert!(matches!(
            "spanish-robot".parse::<VoiceProfile>(),
            Err(ParseProfileError::Gender(_))
        ));
    }

    #[test]
    fn test_infer_gender() {
        assert_eq!(infer_gender("Microsoft Irina Female"), Some(VoiceGender::Female));
        assert_eq!(infer_gender("Google español"), Some(VoiceGender::Female));
        assert_eq!(infer_gender("Voz de hombre"), Some(VoiceGender::Male));
        assert_eq!(infer_gender("MILENA"), Some(VoiceGender::Female));
        assert_eq!(infer_gender("Espeak default"), None);
    }

    #[test]
    fn test_exact_match_wins() {
        let voices = voices();
        let profile: VoiceProfile = "spanish-female".parse().unwrap();
        let voice = select_voice(&voices, &profile, "ru").unwrap();
        assert_eq!(voice.name, "Paulina");
    }

    #[test]
    fn test_language_match_when_gender_missing() {
        let voices = vec![
            Voice::new("Milena", "ru-RU", None),
            Voice::new("Jorge", "es-ES", Some(VoiceGender::Male)),
        ];
        let profile: VoiceProfile = "spanish-female".parse().unwrap();
        let voice = select_voice(&voices, &profile, "ru").unwrap();
        assert_eq!(voice.name, "Jorge");
    }

    #[test]
    fn test_fallback_female_voice() {
        let voices = vec![
            Voice::new("Yuri", "ru-RU", None),
            Voice::new("Voice 2", "ru-RU", Some(VoiceGender::Female)),
            Voice::new("Daniel", "en-GB", Some(VoiceGender::Male)),
        ];
        let profile: VoiceProfile = "spanish-female".parse().unwrap();
        let voice = select_voice(&voices, &profile, "ru").unwrap();
        assert_eq!(voice.name, "Voice 2");
    }

    #[test]
    fn test_fallback_any_voice() {
        let voices = vec![
            Voice::new("Daniel", "en-GB", Some(VoiceGender::Male)),
            Voice::new("Yuri", "ru-RU", None),
        ];
        let profile: VoiceProfile = "spanish-female".parse().unwrap();
        let voice = select_voice(&voices, &profile, "ru").unwrap();
        assert_eq!(voice.name, "Yuri");
    }

    #[test]
    fn test_no_match() {
        let voices = vec![Voice::new("Daniel", "en-GB", Some(VoiceGender::Male))];
        let profile: VoiceProfile = "spanish-female".parse().unwrap();
        assert!(select_voice(&voices, &profile, "ru").is_none());
        assert!(select_voice(&[], &profile, "ru").is_none());
    }

    #[test]
    fn test_language_tag() {
        assert_eq!(language_tag("es"), "es-ES");
        assert_eq!(language_tag("ru"), "ru-RU");
        assert_eq!(language_tag("de"), "de");
    }
}
