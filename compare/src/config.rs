use crate::caps::{Capabilities, Feature};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix; `COMPARE_DISABLE_AVX2=1` masks out AVX2.
pub const ENV_DISABLE_PREFIX: &str = "COMPARE_DISABLE_";

/// `COMPARE_DISABLE_ASM=1` forces the scalar kernels.
pub const ENV_DISABLE_ASM: &str = "COMPARE_DISABLE_ASM";

/// Restricts what the dispatcher may use, on top of what the CPU reports.
///
/// ```toml
/// disable = ["avx2", "ssse3"]
/// scalar_only = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    #[serde(default)]
    pub disable: Vec<Feature>,
    #[serde(default)]
    pub scalar_only: bool,
}

impl DispatchConfig {
    /// Reads the process environment. Entries that are not valid UTF-8 can't
    /// name a feature and are skipped.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?))),
        )
    }

    /// Builds a config from `(name, value)` pairs shaped like the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();

        for (name, value) in vars {
            let (name, value) = (name.as_ref(), value.as_ref());
            if !is_set(value) {
                continue;
            }
            if name == ENV_DISABLE_ASM {
                config.scalar_only = true;
                continue;
            }
            let Some(flag) = name.strip_prefix(ENV_DISABLE_PREFIX) else {
                continue;
            };
            match Feature::from_name(flag) {
                Some(feature) if !config.disable.contains(&feature) => config.disable.push(feature),
                Some(_) => {}
                None => tracing::warn!("ignoring {name}: no such feature"),
            }
        }

        config
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid dispatch config")
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("in {}", path.display()))
    }

    /// Masks `caps` down to what this config allows.
    pub fn apply(&self, caps: Capabilities) -> Capabilities {
        if self.scalar_only {
            return Capabilities::NONE;
        }
        let mut caps = caps;
        for &feature in &self.disable {
            caps.remove(feature);
        }
        caps
    }
}

fn is_set(value: &str) -> bool {
    !(value.is_empty() || value == "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_flags() {
        let config = DispatchConfig::from_vars([
            ("COMPARE_DISABLE_AVX2", "1"),
            ("COMPARE_DISABLE_SSSE3", "yes"),
            ("COMPARE_DISABLE_SSE2", "0"),
            ("COMPARE_DISABLE_AVX2", "1"),
            ("COMPARE_DISABLE_AVX512", "1"),
            ("PATH", "/usr/bin"),
        ]);
        assert_eq!(config.disable, vec![Feature::Avx2, Feature::Ssse3]);
        assert!(!config.scalar_only);
    }

    #[test]
    fn env_disable_asm() {
        let config = DispatchConfig::from_vars([("COMPARE_DISABLE_ASM", "1")]);
        assert!(config.scalar_only);
        assert_eq!(config.apply(Capabilities::AVX2 | Capabilities::WIDE), Capabilities::NONE);
    }

    #[test]
    fn toml_config() {
        let config = DispatchConfig::from_toml_str("disable = [\"avx2\", \"wide\"]\n").unwrap();
        assert_eq!(config.disable, vec![Feature::Avx2, Feature::Wide]);

        let caps = Capabilities::SSE2 | Capabilities::AVX2 | Capabilities::WIDE;
        assert_eq!(config.apply(caps), Capabilities::SSE2);

        assert_eq!(DispatchConfig::from_toml_str("").unwrap(), DispatchConfig::default());
        assert!(DispatchConfig::from_toml_str("disable = [\"avx512\"]").is_err());
        assert!(DispatchConfig::from_toml_str("turbo = true").is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = DispatchConfig { disable: vec![Feature::Neon], scalar_only: true };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(DispatchConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn missing_file() {
        let err = DispatchConfig::from_toml_file("/nonexistent/dispatch.toml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/dispatch.toml"));
    }

    #[test]
    fn toml_file() {
        let path = std::env::temp_dir().join(format!("compare-dispatch-{}.toml", std::process::id()));
        std::fs::write(&path, "scalar_only = true\n").unwrap();
        let config = DispatchConfig::from_toml_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(config.scalar_only);
    }

    #[cfg(unix)]
    #[test]
    fn env_with_non_utf8_entries() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        std::env::set_var("COMPARE_TEST_NON_UTF8", OsStr::from_bytes(&[0x66, 0xff, 0x66]));
        std::env::set_var(OsStr::from_bytes(&[0x4b, 0xfe]), "1");
        let config = DispatchConfig::from_env();
        std::env::remove_var("COMPARE_TEST_NON_UTF8");
        std::env::remove_var(OsStr::from_bytes(&[0x4b, 0xfe]));

        assert!(config.disable.iter().all(|feature| Feature::ALL.contains(feature)));
        assert_eq!(crate::hamming_distance(&[0; 16], &[0xff; 16]), 128);
    }
}
