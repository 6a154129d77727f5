//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    pub fn title() -> String {
        "փետուր".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn posts() -> PathBuf {
        "input/posts".into()
    }

    pub fn statics() -> PathBuf {
        "input/statics".into()
    }

    pub fn styles() -> PathBuf {
        "input/styles".into()
    }

    pub fn output() -> PathBuf {
        "output".into()
    }

    pub fn xml() -> String {
        "xml".into()
    }

    pub fn lock() -> PathBuf {
        "lock.xml".into()
    }

    pub fn ignore_prefix() -> String {
        "~".into()
    }

    pub mod markdown {
        pub fn command() -> Vec<String> {
            ["pandoc", "-f", "markdown", "-t", "html"]
                .into_iter()
                .map(Into::into)
                .collect()
        }
    }

    pub mod transform {
        use super::super::super::Processor;

        pub fn processor() -> Processor {
            Processor::Xsltproc
        }

        pub fn fallback() -> Option<Processor> {
            Some(Processor::Msxsl)
        }
    }
}
