use std::path::Path;
use std::path::PathBuf;

use shell_tidy_core::platform::executable_extension_for_os;

use crate::environment::Environment;

const WORKSPACE_VARIABLES: [&str; 2] = ["${workspaceRoot}", "${workspaceFolder}"];

/// Replaces the workspace variables in a configured path.
pub fn substitute_variables(input: &str, workspace_folder: &Path) -> String {
  let workspace_folder = workspace_folder.to_string_lossy();
  let mut output = input.to_string();
  for variable in WORKSPACE_VARIABLES {
    output = output.replace(variable, &workspace_folder);
  }
  output
}

/// Finds the first executable with the tool name in the PATH directories.
pub fn find_executable_on_path(environment: &impl Environment, tool_name: &str) -> Option<PathBuf> {
  let bin_name = correct_bin_name(environment, tool_name);
  let bin_path = Path::new(&bin_name);
  if bin_path.is_absolute() {
    return environment.is_executable_file(bin_path).then(|| bin_path.to_path_buf());
  }

  for dir in environment.search_paths() {
    let candidate = dir.join(&bin_name);
    if environment.is_executable_file(&candidate) {
      log_debug!(environment, "Found {} on path: {}", tool_name, candidate.display());
      return Some(candidate);
    }
  }
  None
}

fn correct_bin_name(environment: &impl Environment, name: &str) -> String {
  let extension = executable_extension_for_os(&environment.os());
  if extension.is_empty() || name.to_lowercase().ends_with(extension) {
    name.to_string()
  } else {
    format!("{}{}", name, extension)
  }
}
