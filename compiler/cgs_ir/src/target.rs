//! Target configuration for the call-graph passes.
//!
//! The passes never read ambient state: everything target-dependent (object
//! format, C++ ABI mangling scheme, pointer width) is carried by an
//! immutable [`TargetConfig`] value handed to each of them.
//!
//! # Usage
//!
//! ```ignore
//! use cgs_ir::{TargetConfig, ObjectFormat, ManglingScheme};
//!
//! let linux = TargetConfig::from_triple("x86_64-unknown-linux-gnu")?;
//! assert_eq!(linux.object_format(), ObjectFormat::Elf);
//!
//! let msvc = TargetConfig::from_triple("x86_64-pc-windows-msvc")?;
//! assert_eq!(msvc.mangling(), ManglingScheme::Microsoft);
//! ```

use std::fmt;

use crate::ManglingScheme;

/// Error type for target configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Target triple is not of the form `<arch>-<vendor>-<os>[-<env>]`.
    #[error("invalid target triple '{triple}': {reason}")]
    InvalidTriple { triple: String, reason: String },
}

/// Parsed components of a target triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleComponents {
    /// CPU architecture (e.g., `x86_64`, `aarch64`, `wasm32`)
    pub arch: String,
    /// Hardware vendor (e.g., `unknown`, `apple`, `pc`)
    pub vendor: String,
    /// Operating system (e.g., `linux`, `darwin`, `windows`)
    pub os: String,
    /// Environment/ABI (e.g., `gnu`, `musl`, `msvc`) - optional
    pub env: Option<String>,
}

impl TripleComponents {
    /// Parse a target triple string into components.
    ///
    /// Format: `<arch>-<vendor>-<os>[-<env>]`
    pub fn parse(triple: &str) -> Result<Self, ConfigError> {
        let parts: Vec<&str> = triple.split('-').collect();

        if parts.len() < 3 {
            return Err(ConfigError::InvalidTriple {
                triple: triple.to_string(),
                reason: "expected at least 3 components: <arch>-<vendor>-<os>".to_string(),
            });
        }
        if let Some(pos) = parts.iter().position(|p| p.is_empty()) {
            return Err(ConfigError::InvalidTriple {
                triple: triple.to_string(),
                reason: format!("component {} is empty", pos + 1),
            });
        }

        Ok(Self {
            arch: parts[0].to_string(),
            vendor: parts[1].to_string(),
            os: parts[2].to_string(),
            env: parts.get(3).map(|s| (*s).to_string()),
        })
    }

    #[must_use]
    pub fn is_wasm(&self) -> bool {
        self.arch == "wasm32" || self.arch == "wasm64"
    }

    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows" || self.os == "win32"
    }

    #[must_use]
    pub fn is_apple(&self) -> bool {
        ["darwin", "macos", "ios", "tvos", "watchos", "visionos"]
            .iter()
            .any(|os| self.os.starts_with(os))
    }

    /// Whether the environment names a GNU-style (MinGW/Cygwin) toolchain.
    #[must_use]
    pub fn is_gnu_env(&self) -> bool {
        self.env
            .as_deref()
            .is_some_and(|env| env.starts_with("gnu") || env == "cygnus" || env == "itanium")
    }

    /// Object file format implied by the triple.
    #[must_use]
    pub fn object_format(&self) -> ObjectFormat {
        if self.is_wasm() {
            ObjectFormat::Wasm
        } else if self.arch == "dxil" {
            ObjectFormat::DxContainer
        } else if self.arch.starts_with("spirv") {
            ObjectFormat::SpirV
        } else if self.is_windows() {
            ObjectFormat::Coff
        } else if self.is_apple() {
            ObjectFormat::MachO
        } else if self.os.starts_with("aix") {
            ObjectFormat::XCoff
        } else if self.os == "zos" {
            ObjectFormat::Goff
        } else {
            ObjectFormat::Elf
        }
    }

    /// C++ ABI implied by the triple: Microsoft on MSVC-environment
    /// Windows, Itanium everywhere else (including MinGW).
    #[must_use]
    pub fn mangling(&self) -> ManglingScheme {
        if self.is_windows() && !self.is_gnu_env() {
            ManglingScheme::Microsoft
        } else {
            ManglingScheme::Itanium
        }
    }

    #[must_use]
    pub fn pointer_width(&self) -> PointerWidth {
        const WIDE: &[&str] = &[
            "x86_64",
            "aarch64",
            "arm64",
            "riscv64",
            "powerpc64",
            "powerpc64le",
            "s390x",
            "wasm64",
            "mips64",
            "mips64el",
            "loongarch64",
            "sparcv9",
        ];
        if WIDE.contains(&self.arch.as_str()) {
            PointerWidth::Bits64
        } else {
            PointerWidth::Bits32
        }
    }
}

impl fmt::Display for TripleComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.arch, self.vendor, self.os)?;
        if let Some(env) = &self.env {
            write!(f, "-{env}")?;
        }
        Ok(())
    }
}

/// Object file format of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectFormat {
    Elf,
    Coff,
    MachO,
    Wasm,
    XCoff,
    Goff,
    DxContainer,
    SpirV,
    Unknown,
}

impl ObjectFormat {
    /// Whether the format has linker groups at all.
    #[must_use]
    pub fn supports_comdat(self) -> bool {
        !matches!(
            self,
            Self::MachO | Self::XCoff | Self::DxContainer | Self::SpirV | Self::Unknown
        )
    }
}

impl fmt::Display for ObjectFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Elf => "elf",
            Self::Coff => "coff",
            Self::MachO => "macho",
            Self::Wasm => "wasm",
            Self::XCoff => "xcoff",
            Self::Goff => "goff",
            Self::DxContainer => "dxcontainer",
            Self::SpirV => "spirv",
            Self::Unknown => "unknown",
        })
    }
}

/// Width of a data pointer. Only the Microsoft encoding depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerWidth {
    Bits32,
    Bits64,
}

/// Immutable target description shared by the encoder and the comdat pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    triple: String,
    object_format: ObjectFormat,
    mangling: ManglingScheme,
    pointer_width: PointerWidth,
}

impl TargetConfig {
    /// Derive a configuration from a target triple.
    pub fn from_triple(triple: &str) -> Result<Self, ConfigError> {
        let components = TripleComponents::parse(triple)?;
        Ok(Self {
            triple: triple.to_string(),
            object_format: components.object_format(),
            mangling: components.mangling(),
            pointer_width: components.pointer_width(),
        })
    }

    /// Build a configuration directly, without a triple.
    #[must_use]
    pub fn new(
        object_format: ObjectFormat,
        mangling: ManglingScheme,
        pointer_width: PointerWidth,
    ) -> Self {
        Self {
            triple: String::new(),
            object_format,
            mangling,
            pointer_width,
        }
    }

    #[must_use]
    pub fn with_object_format(mut self, object_format: ObjectFormat) -> Self {
        self.object_format = object_format;
        self
    }

    #[must_use]
    pub fn with_mangling(mut self, mangling: ManglingScheme) -> Self {
        self.mangling = mangling;
        self
    }

    #[must_use]
    pub fn with_pointer_width(mut self, pointer_width: PointerWidth) -> Self {
        self.pointer_width = pointer_width;
        self
    }

    /// The triple this configuration was parsed from; empty when built
    /// with [`new`](Self::new).
    #[must_use]
    pub fn triple(&self) -> &str {
        &self.triple
    }

    #[must_use]
    pub fn object_format(&self) -> ObjectFormat {
        self.object_format
    }

    #[must_use]
    pub fn mangling(&self) -> ManglingScheme {
        self.mangling
    }

    #[must_use]
    pub fn pointer_width(&self) -> PointerWidth {
        self.pointer_width
    }
}
