//! # Framework Version Context
//!
//! @title Target Framework Defaults
//! @author Ramprasad
//!
//! Whether the XML types' *default* configuration is secure depends on the
//! target framework. .NET Framework 4.5.2 changed `XmlDocument` (and the
//! reader resolver defaults) to no longer resolve external resources, and
//! every .NET Core / .NET 5+ runtime ships the secure defaults.
//!
//! The fact is computed once per compilation and never changes afterwards.
//!
//! ## Accepted Monikers
//!
//! | Form | Example |
//! |------|---------|
//! | Long | `.NETFramework,Version=v4.5.2`, `.NETCoreApp,Version=v3.1` |
//! | Short framework | `net45`, `net452`, `net48` |
//! | Short core | `netcoreapp3.1`, `net6.0`, `net8.0-windows` |
//! | Short standard | `netstandard1.3`, `netstandard2.0` |
//! | Bare version | `v4.5.2` (.NET Framework) |

use crate::host::SemanticModel;
use regex::Regex;

/// Runtime family a moniker names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Framework,
    Core,
    Standard,
}

/// Parsed target framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameworkVersion {
    pub platform: Platform,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FrameworkVersion {
    /// Returns `true` if the XML types default to not resolving external
    /// resources on this target.
    pub fn has_secure_xml_defaults(&self) -> bool {
        let version = (self.major, self.minor, self.patch);
        match self.platform {
            Platform::Framework => version >= (4, 5, 2),
            Platform::Core => true,
            // netstandard1.3 is the first standard whose minimum .NET
            // Framework implementation is 4.6.
            Platform::Standard => version >= (1, 3, 0),
        }
    }

    /// Parses a target framework moniker.
    ///
    /// # Returns
    ///
    /// The parsed version, or `None` for unrecognized monikers.
    pub fn parse(moniker: &str) -> Option<Self> {
        let moniker = moniker.trim();

        let long = Regex::new(
            r"(?i)^\.NET(Framework|CoreApp|Standard)\s*,\s*Version\s*=\s*v(\d+)(?:\.(\d+))?(?:\.(\d+))?",
        )
        .ok()?;
        if let Some(caps) = long.captures(moniker) {
            let platform = match caps[1].to_ascii_lowercase().as_str() {
                "framework" => Platform::Framework,
                "coreapp" => Platform::Core,
                _ => Platform::Standard,
            };
            return Some(Self::from_parts(
                platform,
                caps.get(2).map(|m| m.as_str()),
                caps.get(3).map(|m| m.as_str()),
                caps.get(4).map(|m| m.as_str()),
            ));
        }

        let lower = moniker.to_ascii_lowercase();

        // net45, net452, net48, net481
        let short_framework = Regex::new(r"^net(\d)(\d)(\d)?$").ok()?;
        if let Some(caps) = short_framework.captures(&lower) {
            return Some(Self::from_parts(
                Platform::Framework,
                caps.get(1).map(|m| m.as_str()),
                caps.get(2).map(|m| m.as_str()),
                caps.get(3).map(|m| m.as_str()),
            ));
        }

        // netcoreapp3.1, net6.0, net8.0-windows, netstandard2.0
        let dotted = Regex::new(r"^(netcoreapp|netstandard|net)(\d+)\.(\d+)(?:-[a-z0-9.]+)?$").ok()?;
        if let Some(caps) = dotted.captures(&lower) {
            let platform = if &caps[1] == "netstandard" {
                Platform::Standard
            } else {
                Platform::Core
            };
            return Some(Self::from_parts(
                platform,
                caps.get(2).map(|m| m.as_str()),
                caps.get(3).map(|m| m.as_str()),
                None,
            ));
        }

        let bare = Regex::new(r"^v(\d+)\.(\d+)(?:\.(\d+))?$").ok()?;
        bare.captures(&lower).map(|caps| {
            Self::from_parts(
                Platform::Framework,
                caps.get(1).map(|m| m.as_str()),
                caps.get(2).map(|m| m.as_str()),
                caps.get(3).map(|m| m.as_str()),
            )
        })
    }

    fn from_parts(
        platform: Platform,
        major: Option<&str>,
        minor: Option<&str>,
        patch: Option<&str>,
    ) -> Self {
        let number = |part: Option<&str>| part.and_then(|p| p.parse().ok()).unwrap_or(0);
        Self {
            platform,
            major: number(major),
            minor: number(minor),
            patch: number(patch),
        }
    }
}

/// Per-compilation fact: is the target framework's default XML
/// configuration secure?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameworkVersionContext {
    version: Option<FrameworkVersion>,
    is_default_configuration_secure: bool,
}

impl FrameworkVersionContext {
    /// Derives the context from a moniker; a missing or unrecognized moniker
    /// is treated as not secure by default.
    pub fn from_moniker(moniker: Option<&str>) -> Self {
        let version = moniker.and_then(FrameworkVersion::parse);
        if version.is_none() {
            if let Some(m) = moniker {
                log::debug!("Unrecognized target framework moniker `{}`", m);
            }
        }

        Self {
            version,
            is_default_configuration_secure: version
                .map(|v| v.has_secure_xml_defaults())
                .unwrap_or(false),
        }
    }

    /// Computes the context for a compilation, preferring `override_moniker`
    /// over the framework the compilation declares.
    pub fn for_compilation(model: &dyn SemanticModel, override_moniker: Option<&str>) -> Self {
        Self::from_moniker(override_moniker.or_else(|| model.target_framework()))
    }

    /// Context with a fixed answer, independent of any moniker.
    pub fn fixed(is_default_configuration_secure: bool) -> Self {
        Self {
            version: None,
            is_default_configuration_secure,
        }
    }

    pub fn is_default_configuration_secure(&self) -> bool {
        self.is_default_configuration_secure
    }

    pub fn version(&self) -> Option<FrameworkVersion> {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secure(moniker: &str) -> bool {
        FrameworkVersionContext::from_moniker(Some(moniker)).is_default_configuration_secure()
    }

    #[test]
    fn test_framework_threshold() {
        assert!(!secure(".NETFramework,Version=v4.5.1"));
        assert!(secure(".NETFramework,Version=v4.5.2"));
        assert!(secure(".NETFramework,Version=v4.6"));
        assert!(!secure("net45"));
        assert!(!secure("net451"));
        assert!(secure("net452"));
        assert!(secure("net48"));
        assert!(!secure("v4.0"));
        assert!(secure("v4.7.2"));
    }

    #[test]
    fn test_core_and_standard() {
        assert!(secure("netcoreapp2.1"));
        assert!(secure("net6.0"));
        assert!(secure("net8.0-windows"));
        assert!(secure(".NETCoreApp,Version=v3.1"));
        assert!(!secure("netstandard1.2"));
        assert!(secure("netstandard1.3"));
        assert!(secure(".NETStandard,Version=v2.0"));
    }

    #[test]
    fn test_missing_or_unknown_is_insecure() {
        assert!(!FrameworkVersionContext::from_moniker(None).is_default_configuration_secure());
        assert!(!secure("silverlight5"));
    }

    #[test]
    fn test_parse_long_form() {
        let version = FrameworkVersion::parse(".NETFramework,Version=v4.7.2").unwrap();
        assert_eq!(version.platform, Platform::Framework);
        assert_eq!((version.major, version.minor, version.patch), (4, 7, 2));
    }
}
