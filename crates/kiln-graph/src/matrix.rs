//! Static command matrix keyed by (platform, build type).
//!
//! Templates are kept verbatim; the only substitutions are the structural
//! placeholders `$in`, `$out` and `$root`. Nothing here interprets flags.

use kiln_model::{BuildType, CommandLine, Fragment, Placeholder, Platform, Word};

use crate::error::Result;
use crate::graph::DiscoveredDeps;

/// The four per-configuration command templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTemplates {
    pub compile: &'static str,
    pub link: &'static str,
    pub bootstrap: &'static str,
    pub harness_compile: &'static str,
}

/// Tokenized form of [`CommandTemplates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSet {
    pub compile: CommandLine,
    pub link: CommandLine,
    pub bootstrap: CommandLine,
    pub harness_compile: CommandLine,
}

/// Settings shared by every build type of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformSettings {
    pub exe_suffix: &'static str,
    pub obj_suffix: &'static str,
    /// Define passed to the code generator to select the calling convention.
    pub codegen_define: &'static str,
    pub amalgamate: &'static str,
    pub msvc_deps: bool,
}

impl PlatformSettings {
    pub fn executable(&self, stem: &str) -> String {
        format!("{stem}{}", self.exe_suffix)
    }

    pub fn object(&self, stem: &str) -> String {
        format!("{stem}{}", self.obj_suffix)
    }

    /// How compiles on this platform report the headers they read.
    pub fn discovered_deps(&self) -> DiscoveredDeps {
        if self.msvc_deps {
            DiscoveredDeps::Msvc
        } else {
            DiscoveredDeps::Gcc {
                depfile: Word(vec![
                    Fragment::Var(Placeholder::Output),
                    Fragment::Text(".d".to_string()),
                ]),
            }
        }
    }
}

static WINDOWS: PlatformSettings = PlatformSettings {
    exe_suffix: ".exe",
    obj_suffix: ".obj",
    codegen_define: "WIN",
    amalgamate: "python $root/build_amalg.py embed $root $in",
    msvc_deps: true,
};

static LINUX: PlatformSettings = PlatformSettings {
    exe_suffix: "",
    obj_suffix: ".o",
    codegen_define: "SYSV",
    amalgamate: "python3 $root/build_amalg.py embed $root $in",
    msvc_deps: false,
};

const WINDOWS_BOOTSTRAP: &str = "cl /nologo /wd4132 /wd4324 $in /link /out:$out";
const WINDOWS_HARNESS: &str =
    "cl /nologo /D_CRT_SECURE_NO_WARNINGS /Iembed /W4 /Wall /WX $in /link onecore.lib user32.lib /out:$out";
const WINDOWS_DEBUG_LINK: &str = "link /nologo gdi32.lib user32.lib onecore.lib /DEBUG $in /out:$out";

static WINDOWS_RELEASE: CommandTemplates = CommandTemplates {
    compile: "cl /showIncludes /nologo /FS /Ox /GL /Zi /DNDEBUG /DIMPLSTATIC= /DIMPLEXTERN=extern /D_CRT_SECURE_NO_DEPRECATE /W4 /WX /I$root /c $in /Fo$out /Fddyibicc.pdb",
    link: "link /nologo gdi32.lib user32.lib onecore.lib /LTCG /DEBUG /OPT:REF /OPT:ICF $in /out:$out",
    bootstrap: WINDOWS_BOOTSTRAP,
    harness_compile: WINDOWS_HARNESS,
};

static WINDOWS_DEBUG: CommandTemplates = CommandTemplates {
    compile: "cl /showIncludes /nologo /FS /Od /Zi /D_DEBUG /DIMPLSTATIC= /DIMPLEXTERN=extern /D_CRT_SECURE_NO_DEPRECATE /W4 /WX /I$root /c $in /Fo:$out /Fddyibicc.pdb",
    link: WINDOWS_DEBUG_LINK,
    bootstrap: WINDOWS_BOOTSTRAP,
    harness_compile: WINDOWS_HARNESS,
};

static WINDOWS_SANITIZED: CommandTemplates = CommandTemplates {
    compile: "cl /showIncludes /nologo /FS /Od /fsanitize=address /Zi /D_DEBUG /DIMPLSTATIC= /DIMPLEXTERN=extern /D_CRT_SECURE_NO_DEPRECATE /W4 /WX /I$root /c $in /Fo:$out /Fddyibicc.pdb",
    link: WINDOWS_DEBUG_LINK,
    bootstrap: WINDOWS_BOOTSTRAP,
    harness_compile: WINDOWS_HARNESS,
};

const LINUX_BOOTSTRAP: &str = "clang -o $out $in -lm";
const LINUX_LINK: &str = "clang -o $out $in -pthread -lm -ldl -g";
const LINUX_HARNESS: &str = "clang -Iembed -Wall -Wextra -Werror -ldl -o $out $in";

static LINUX_RELEASE: CommandTemplates = CommandTemplates {
    compile: "clang -std=c11 -MMD -MT $out -MF $out.d -g -Oz -fcolor-diagnostics -fno-common -Wall -Werror -Wno-switch -D_DEBUG -DIMPLSTATIC= -DIMPLEXTERN=extern -pthread -c -I$root $in -o $out",
    link: LINUX_LINK,
    bootstrap: LINUX_BOOTSTRAP,
    harness_compile: LINUX_HARNESS,
};

static LINUX_DEBUG: CommandTemplates = CommandTemplates {
    compile: "clang -std=c11 -MMD -MT $out -MF $out.d -g -O0 -fcolor-diagnostics -fno-common -Wall -Werror -Wno-switch -DNDEBUG -DIMPLSTATIC= -DIMPLEXTERN=extern -pthread -I$root -c $in -o $out",
    link: LINUX_LINK,
    bootstrap: LINUX_BOOTSTRAP,
    harness_compile: LINUX_HARNESS,
};

static LINUX_SANITIZED: CommandTemplates = CommandTemplates {
    compile: "clang -std=c11 -MMD -MT $out -MF $out.d -g -O0 -fsanitize=address -fcolor-diagnostics -fno-common -Wall -Werror -Wno-switch -D_DEBUG -DIMPLSTATIC= -DIMPLEXTERN=extern -pthread -c -I$root $in -o $out",
    link: "clang -fsanitize=address -o $out $in -pthread -lm -ldl -g",
    bootstrap: LINUX_BOOTSTRAP,
    harness_compile: "clang -Iembed -Wall -Wextra -Werror -ldl -fsanitize=address -o $out $in",
};

/// Lookup table for every supported configuration cell.
pub struct ConfigMatrix;

impl ConfigMatrix {
    pub fn templates(platform: Platform, build_type: BuildType) -> &'static CommandTemplates {
        match (platform, build_type) {
            (Platform::Windows, BuildType::Release) => &WINDOWS_RELEASE,
            (Platform::Windows, BuildType::Debug) => &WINDOWS_DEBUG,
            (Platform::Windows, BuildType::Sanitized) => &WINDOWS_SANITIZED,
            (Platform::Linux, BuildType::Release) => &LINUX_RELEASE,
            (Platform::Linux, BuildType::Debug) => &LINUX_DEBUG,
            (Platform::Linux, BuildType::Sanitized) => &LINUX_SANITIZED,
        }
    }

    pub fn settings(platform: Platform) -> &'static PlatformSettings {
        match platform {
            Platform::Windows => &WINDOWS,
            Platform::Linux => &LINUX,
        }
    }

    /// Tokenizes the templates of one cell.
    ///
    /// # Errors
    ///
    /// Fails only if a template in the table is malformed.
    pub fn resolve(platform: Platform, build_type: BuildType) -> Result<CommandSet> {
        let templates = Self::templates(platform, build_type);
        Ok(CommandSet {
            compile: CommandLine::parse(templates.compile)?,
            link: CommandLine::parse(templates.link)?,
            bootstrap: CommandLine::parse(templates.bootstrap)?,
            harness_compile: CommandLine::parse(templates.harness_compile)?,
        })
    }
}
