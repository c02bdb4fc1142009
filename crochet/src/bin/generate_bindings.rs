//! Generate UniFFI Swift and Kotlin bindings for the crochet core
//!
//! Run: cargo run --bin generate-bindings [swift|kotlin|all]
//!
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │ DEPENDENCY MAP - Output paths must match the mobile app projects            │
//! │                                                                             │
//! │ Inputs:                                                                     │
//! │   target/release/libcrochet.{dylib,so}   ← Built library for bindgen        │
//! │                                                                             │
//! │ Outputs:                                                                    │
//! │   bindings/swift/crochet.swift           ← Swift bindings                   │
//! │   bindings/swift/crochetFFI.h            ← C header                         │
//! │   bindings/swift/module.modulemap        ← Clang module map                 │
//! │   bindings/kotlin/uniffi/crochet/crochet.kt ← Kotlin bindings (JNA)         │
//! └─────────────────────────────────────────────────────────────────────────────┘

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Language {
    Swift,
    Kotlin,
}

impl Language {
    fn as_str(self) -> &'static str {
        match self {
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
        }
    }
}

fn main() -> Result<()> {
    let languages = match env::args().nth(1).as_deref() {
        None | Some("all") => vec![Language::Swift, Language::Kotlin],
        Some("swift") => vec![Language::Swift],
        Some("kotlin") => vec![Language::Kotlin],
        Some(other) => bail!("unknown language {:?} (expected swift, kotlin or all)", other),
    };

    let rust_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let project_root = rust_dir
        .parent()
        .context("crate directory has no parent")?
        .to_path_buf();
    let out_root = project_root.join("bindings");

    println!("Building Rust library...");
    run_cmd("cargo", &["build", "--release", "-p", "crochet"], &rust_dir)?;

    let library = release_library(&project_root)?;

    for language in languages {
        let out_dir = out_root.join(language.as_str());
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("creating {}", out_dir.display()))?;

        println!("Generating {} bindings...", language.as_str());
        run_cmd(
            "cargo",
            &[
                "run",
                "--bin",
                "uniffi-bindgen",
                "generate",
                "--library",
                &library.to_string_lossy(),
                "--language",
                language.as_str(),
                "--out-dir",
                &out_dir.to_string_lossy(),
            ],
            &rust_dir,
        )?;

        if language == Language::Swift {
            fix_swift(&out_dir)?;
        }
    }

    println!("Done! Bindings written to {}", out_root.display());
    Ok(())
}

/// Swift 6 strict concurrency rejects the generated mutable global
fn fix_swift(out_dir: &Path) -> Result<()> {
    let swift_file = out_dir.join("crochet.swift");
    let content = fs::read_to_string(&swift_file)
        .with_context(|| format!("reading {}", swift_file.display()))?;
    let content = content.replace(
        "private var initializationResult",
        "nonisolated(unsafe) private var initializationResult",
    );
    fs::write(&swift_file, content).with_context(|| format!("writing {}", swift_file.display()))?;

    println!("Writing modulemap...");
    fs::write(
        out_dir.join("module.modulemap"),
        "module crochetFFI {\n    header \"crochetFFI.h\"\n    export *\n}\n",
    )
    .context("writing modulemap")?;
    Ok(())
}

/// The workspace target dir holds the cdylib under a platform-specific name
fn release_library(project_root: &Path) -> Result<PathBuf> {
    let release = project_root.join("target/release");
    ["libcrochet.dylib", "libcrochet.so", "crochet.dll"]
        .iter()
        .map(|name| release.join(name))
        .find(|path| path.exists())
        .with_context(|| format!("no crochet dynamic library in {}", release.display()))
}

fn run_cmd(program: &str, args: &[&str], dir: &Path) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .current_dir(dir)
        .status()
        .with_context(|| format!("failed to run {}", program))?;

    if !status.success() {
        bail!("{} failed with status: {}", program, status);
    }
    Ok(())
}
