use crate::error::Result;
use std::process::Command;
use tracing::debug;

use super::r#trait::{LayoutId, LayoutRegistry, LayoutSnapshot};

/// X11 layouts through `setxkbmap`.
///
/// `setxkbmap -query` lists the layout groups but not which one is locked,
/// so the active layout is reported as unknown. Activating reorders the
/// group list with the wanted layout first, which also resets the group
/// lock to it.
pub struct SetxkbmapLayouts;

impl SetxkbmapLayouts {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_query(output: &str) -> Vec<LayoutId> {
        let mut names: Vec<&str> = Vec::new();
        let mut variants: Vec<&str> = Vec::new();

        for line in output.lines() {
            if let Some((key, value)) = line.split_once(':') {
                match key.trim() {
                    "layout" => names = value.trim().split(',').map(str::trim).collect(),
                    "variant" => variants = value.trim().split(',').map(str::trim).collect(),
                    _ => {}
                }
            }
        }

        names
            .into_iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(i, name)| LayoutId::new(name, variants.get(i).copied().unwrap_or("")))
            .collect()
    }

    /// `-layout`/`-variant` arguments for `layouts` in the given order
    pub fn layout_args(layouts: &[&LayoutId]) -> Vec<String> {
        let names: Vec<&str> = layouts.iter().map(|l| l.name.as_str()).collect();
        let variants: Vec<&str> = layouts.iter().map(|l| l.variant.as_str()).collect();

        vec![
            "-layout".to_string(),
            names.join(","),
            "-variant".to_string(),
            variants.join(","),
        ]
    }

    fn run(args: &[String]) -> Result<String> {
        debug!("setxkbmap {}", args.join(" "));
        let output = Command::new("setxkbmap").args(args).output().map_err(|e| {
            crate::typer_error!(layout, "setxkbmap could not be run: {}", e)
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(crate::typer_error!(layout, "setxkbmap failed: {}", stderr.trim()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait::async_trait]
impl LayoutRegistry for SetxkbmapLayouts {
    fn backend_name(&self) -> &'static str {
        "setxkbmap"
    }

    async fn snapshot(&self) -> Result<LayoutSnapshot> {
        let output = Self::run(&["-query".to_string()])?;
        let layouts = Self::parse_query(&output);
        Ok(LayoutSnapshot {
            layouts,
            active: None,
        })
    }

    async fn activate(&self, snapshot: &LayoutSnapshot, index: usize) -> Result<()> {
        let chosen = snapshot
            .layouts
            .get(index)
            .ok_or_else(|| crate::typer_error!(layout, "layout index {} out of range", index))?;

        let mut ordered = vec![chosen];
        ordered.extend(
            snapshot
                .layouts
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, layout)| layout),
        );

        Self::run(&Self::layout_args(&ordered)).map(|_| ())
    }

    async fn restore(&self, snapshot: &LayoutSnapshot) -> Result<()> {
        if snapshot.layouts.is_empty() {
            return Ok(());
        }
        let original: Vec<&LayoutId> = snapshot.layouts.iter().collect();
        Self::run(&Self::layout_args(&original)).map(|_| ())
    }
}
