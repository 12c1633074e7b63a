//! New skill scaffolding with the standard directory layout

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, SkillError};
use crate::manifest::MANIFEST_FILE;
use crate::text::is_valid_slug;

const SKILL_TEMPLATE: &str = r#"---
name: {name}
description: TODO - Add a description of when this skill should be used. Be specific about trigger conditions.
---

# {title}

## Overview

TODO - Describe the purpose and capabilities of this skill.

## When to Use This Skill

- TODO - Trigger condition 1
- TODO - Trigger condition 2

## Workflow

### Step 1: [Action]

TODO - Instructions for the agent

### Step 2: [Action]

TODO - Instructions for the agent

## Examples

**User Request**: "TODO - Example prompt"

## Error Handling

- If [error condition], then [action]

## References

- Load `references/example.md` for additional context (delete if not needed)
"#;

const REFERENCE_TEMPLATE: &str = r#"# Reference Documentation

TODO - Add reference documentation to load on demand: detailed
specifications, API documentation, schema definitions, extended examples.

Keep this separate from SKILL.md to avoid loading unnecessary context.
"#;

const SCRIPT_TEMPLATE: &str = r#"#!/usr/bin/env python3
"""TODO - Describe what this script does."""

import argparse


def main():
    parser = argparse.ArgumentParser(description="TODO - Script description")
    parser.add_argument("input", help="TODO - Input description")
    args = parser.parse_args()
    print(f"Processing: {args.input}")


if __name__ == "__main__":
    main()
"#;

/// "api-integration" -> "Api Integration"
fn title_case(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Create `<parent>/<name>/` with SKILL.md, references/, scripts/ and assets/
///
/// Returns the new skill directory.
pub fn scaffold_skill(name: &str, parent: &Path) -> Result<PathBuf> {
    if !is_valid_slug(name) {
        return Err(SkillError::Scaffold(format!(
            "invalid skill name '{}': use lowercase letters, numbers, and hyphens",
            name
        )));
    }

    let skill_path = parent.join(name);
    if skill_path.exists() {
        return Err(SkillError::Scaffold(format!(
            "skill directory already exists: {}",
            skill_path.display()
        )));
    }

    for subdir in ["scripts", "references", "assets"] {
        fs::create_dir_all(skill_path.join(subdir))?;
    }

    let manifest = SKILL_TEMPLATE
        .replace("{name}", name)
        .replace("{title}", &title_case(name));
    fs::write(skill_path.join(MANIFEST_FILE), manifest)?;
    fs::write(skill_path.join("references").join("example.md"), REFERENCE_TEMPLATE)?;
    fs::write(skill_path.join("scripts").join("example.py"), SCRIPT_TEMPLATE)?;
    fs::write(skill_path.join("assets").join(".gitkeep"), "")?;

    info!("Created skill: {}", skill_path.display());
    Ok(skill_path)
}
