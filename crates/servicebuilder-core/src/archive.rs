//! Packaging of compiled classes into the result archive.
//!
//! Runs in the workspace's `out` directory after every source compiled:
//! the runtime archive and the support library are extracted next to the
//! compiled classes, then the whole directory is re-archived with the
//! manifest template.

use std::path::PathBuf;

use crate::error::Result;
use crate::resources::{LIB_DIR, MANIFEST_ENTRY, ResourcePack};
use crate::stage::StagedInputs;
use crate::toolchain::{ToolInvocation, ToolRunner, ToolStage, Toolchain, run_checked};
use crate::workspace::Workspace;

/// The extract, extract, pack sequence for one workspace.
pub fn packaging_invocations(
    toolchain: &Toolchain,
    workspace: &Workspace,
    staged: &StagedInputs,
    pack: &ResourcePack,
) -> Vec<ToolInvocation> {
    let out = workspace.out_dir();
    let support_library = workspace.path(LIB_DIR).join(&pack.support_library);

    vec![
        ToolInvocation::new(
            &toolchain.jar,
            out,
            "jar extraction of h2o-genmodel failed",
            ToolStage::Package,
        )
        .arg("xf")
        .arg(workspace.path(&staged.runtime_archive)),
        ToolInvocation::new(
            &toolchain.jar,
            out,
            "jar extraction of gson failed",
            ToolStage::Package,
        )
        .arg("xf")
        .arg(support_library),
        ToolInvocation::new(&toolchain.jar, out, "jar creation failed", ToolStage::Package)
            .arg("cfm")
            .arg(workspace.result_archive())
            .arg(manifest_arg())
            .arg("."),
    ]
}

/// Extract dependencies into `out` and pack it. Returns the archive path.
pub fn build_archive(
    runner: &dyn ToolRunner,
    toolchain: &Toolchain,
    workspace: &Workspace,
    staged: &StagedInputs,
    pack: &ResourcePack,
) -> Result<PathBuf> {
    for invocation in packaging_invocations(toolchain, workspace, staged, pack) {
        tracing::info!(step = %invocation, "packaging");
        run_checked(runner, &invocation)?;
    }
    Ok(workspace.result_archive())
}

/// Manifest path relative to `out`, using the platform separator.
fn manifest_arg() -> PathBuf {
    MANIFEST_ENTRY.split('/').collect()
}
