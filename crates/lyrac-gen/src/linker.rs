//! System linker invocation.
//!
//! The object file is handed to the platform C compiler driver, which
//! also resolves the libc symbols the prelude declares (`exit`,
//! `putchar`, `puts`).

use std::path::Path;
use std::process::Command;

use crate::error::{CodeGenError, Result};

/// Links object files into an executable via the system toolchain.
pub struct Linker {
    cmd: String,
}

impl Linker {
    pub fn new() -> Self {
        let cmd = if cfg!(target_os = "windows") {
            "clang".to_string()
        } else {
            "cc".to_string()
        };
        Self { cmd }
    }

    /// Links `object` into `output`.
    pub fn link(&self, object: &Path, output: &Path) -> Result<()> {
        let status = Command::new(&self.cmd)
            .arg(object)
            .arg("-o")
            .arg(output)
            .status()
            .map_err(|e| CodeGenError::LinkerNotFound {
                cmd: self.cmd.clone(),
                message: e.to_string(),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(CodeGenError::LinkFailed(format!(
                "`{}` exited with {}",
                self.cmd, status
            )))
        }
    }
}

impl Default for Linker {
    fn default() -> Self {
        Self::new()
    }
}
