use clap::Parser;
use duckytie_audio::SayOptions;
use std::path::PathBuf;

/// Literal usage example shown whenever a keyword option is malformed.
pub const KEYWORD_EXAMPLE: &str = "duckytie \"This is the text argument\" \
\"audio_filename=name_of_the_file\" \"language=pt\" \"slow=True\" \"must_delete=False\"";

const KEYWORDS: &str = "audio_filename, language, slow, must_delete";

#[derive(Parser, Debug)]
#[command(
    name = "duckytie",
    version,
    about = "Read text aloud",
    after_help = format!("Example:\n  {KEYWORD_EXAMPLE}")
)]
pub struct Cli {
    /// Text to read aloud. Without it a short demonstration is spoken.
    pub text: Option<String>,

    /// Options for this call as KEY=VALUE (audio_filename, language, slow, must_delete)
    #[arg(value_name = "KEY=VALUE", value_parser = parse_keyword, requires = "text")]
    pub keywords: Vec<Keyword>,

    /// Audio file name without extension
    #[arg(long, value_name = "NAME")]
    pub audio_filename: Option<String>,

    /// Language code, e.g. en, fr, pt
    #[arg(long, short = 'l', value_name = "CODE")]
    pub language: Option<String>,

    /// Speak slowly
    #[arg(long)]
    pub slow: bool,

    /// Delete the audio file after playing it
    #[arg(long, value_name = "BOOL", value_parser = parse_bool)]
    pub must_delete: Option<bool>,

    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the supported language codes and exit
    #[arg(long)]
    pub list_languages: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    AudioFilename(String),
    Language(String),
    Slow(bool),
    MustDelete(bool),
}

fn parse_keyword(s: &str) -> Result<Keyword, String> {
    let Some((key, value)) = s.split_once('=') else {
        return Err(format!(
            "'{s}' was passed as a positional argument; keyword options must look like \
             KEY=VALUE. Use the following example to pass them on the command line:\n\n\t{KEYWORD_EXAMPLE}\n"
        ));
    };
    match key.trim() {
        "audio_filename" => Ok(Keyword::AudioFilename(value.to_string())),
        "language" => Ok(Keyword::Language(value.trim().to_string())),
        "slow" => parse_bool(value).map(Keyword::Slow),
        "must_delete" => parse_bool(value).map(Keyword::MustDelete),
        other => Err(format!(
            "unknown keyword '{other}'; expected one of {KEYWORDS}. Example:\n\n\t{KEYWORD_EXAMPLE}\n"
        )),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(format!("expected True or False, got '{s}'")),
    }
}

impl Cli {
    /// Overlay flags, then KEY=VALUE keywords, onto `base`.
    pub fn say_options(&self, mut base: SayOptions) -> SayOptions {
        if let Some(v) = &self.audio_filename {
            base.audio_filename = v.clone();
        }
        if let Some(v) = &self.language {
            base.language = v.clone();
        }
        if self.slow {
            base.slow = true;
        }
        if let Some(v) = self.must_delete {
            base.must_delete = v;
        }
        for kw in &self.keywords {
            match kw {
                Keyword::AudioFilename(v) => base.audio_filename = v.clone(),
                Keyword::Language(v) => base.language = v.clone(),
                Keyword::Slow(v) => base.slow = *v,
                Keyword::MustDelete(v) => base.must_delete = *v,
            }
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_single_text_uses_defaults() {
        let cli = Cli::try_parse_from(["duckytie", "hello there"]).unwrap();
        assert_eq!(cli.text.as_deref(), Some("hello there"));
        assert_eq!(cli.say_options(SayOptions::default()), SayOptions::default());
    }

    #[test]
    fn test_no_arguments_means_demo() {
        let cli = Cli::try_parse_from(["duckytie"]).unwrap();
        assert!(cli.text.is_none());
        assert!(cli.keywords.is_empty());
    }

    #[test]
    fn test_keywords_override_defaults() {
        let cli = Cli::try_parse_from(["duckytie", "hi", "language=fr", "slow=True"]).unwrap();
        let opts = cli.say_options(SayOptions::default());
        assert_eq!(opts.language, "fr");
        assert!(opts.slow);
        assert!(opts.must_delete);
        assert_eq!(opts.audio_filename, "temp");
    }

    #[test]
    fn test_all_keywords() {
        let cli = Cli::try_parse_from([
            "duckytie",
            "text",
            "audio_filename=name_of_the_file",
            "language=pt",
            "slow=true",
            "must_delete=False",
        ])
        .unwrap();
        assert_eq!(
            cli.keywords,
            vec![
                Keyword::AudioFilename("name_of_the_file".into()),
                Keyword::Language("pt".into()),
                Keyword::Slow(true),
                Keyword::MustDelete(false),
            ]
        );
    }

    #[test]
    fn test_keyword_beats_flag() {
        let cli = Cli::try_parse_from([
            "duckytie",
            "--language",
            "de",
            "--must-delete",
            "false",
            "hi",
            "language=es",
        ])
        .unwrap();
        let opts = cli.say_options(SayOptions::default());
        assert_eq!(opts.language, "es");
        assert!(!opts.must_delete);
    }

    #[test]
    fn test_token_without_equals_is_usage_error() {
        let err = Cli::try_parse_from(["duckytie", "hi", "badtoken"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        let msg = err.to_string();
        assert!(msg.contains("badtoken"));
        assert!(msg.contains("audio_filename=name_of_the_file"));
    }

    #[test]
    fn test_unknown_keyword_and_bad_bool_rejected() {
        assert!(Cli::try_parse_from(["duckytie", "hi", "voice=x"]).is_err());
        assert!(Cli::try_parse_from(["duckytie", "hi", "slow=maybe"]).is_err());
    }

    #[test]
    fn test_value_may_contain_equals() {
        let cli = Cli::try_parse_from(["duckytie", "hi", "audio_filename=a=b"]).unwrap();
        assert_eq!(cli.keywords, vec![Keyword::AudioFilename("a=b".into())]);
    }
}
