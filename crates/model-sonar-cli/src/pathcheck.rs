//! Model-path diagnosis: does the path exist, and if not, what does the
//! filesystem around it actually contain.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct CheckArgs {
    /// Path to check (model file or models directory)
    pub path: PathBuf,
}

pub fn run(args: &CheckArgs) -> Result<()> {
    let path = &args.path;
    println!("Checking path: {}", path.display());

    if path.exists() {
        println!("Path exists!");
        if path.is_dir() {
            println!("It is a directory. Contents:");
            list_dir(path);
        } else {
            println!("It is a file.");
        }
        return Ok(());
    }

    println!("Path does NOT exist.");
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            println!("Checking parent: {}", parent.display());
            if parent.exists() {
                println!("Parent exists. Contents:");
                list_dir(parent);
            } else {
                println!("Parent does NOT exist.");
            }
        }
        _ => println!("Path has no parent to check."),
    }

    Ok(())
}

fn list_dir(dir: &Path) {
    match dir_entries(dir) {
        Ok(names) => {
            for name in names {
                println!(" - {}", name);
            }
        }
        Err(err) => println!("Error listing dir: {}", err),
    }
}

fn dir_entries(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_entries_lists_and_sorts() {
        let dir = std::env::temp_dir().join("model-sonar-pathcheck-test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.gguf"), b"").unwrap();
        std::fs::write(dir.join("a.gguf"), b"").unwrap();

        let names = dir_entries(&dir).unwrap();
        assert_eq!(names, ["a.gguf", "b.gguf"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_dir_entries_missing_dir_is_an_error() {
        let dir = std::env::temp_dir().join("model-sonar-no-such-dir");
        assert!(dir_entries(&dir).is_err());
    }
}
