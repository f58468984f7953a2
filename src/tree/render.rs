//! Box-drawing structure view of a snapshot

use crate::tree::entry::EntryKind;
use crate::tree::path::RelPath;
use crate::tree::snapshot::{SnapshotEntry, TreeSnapshot};
use std::collections::BTreeMap;

type Children<'a> = BTreeMap<Option<RelPath>, Vec<(&'a RelPath, &'a SnapshotEntry)>>;

/// Render `snapshot` as an indented tree, root first as `name/`.
///
/// At each level directories come before files, each group sorted by name.
/// Directories carry a trailing `/`.
pub fn render_structure(snapshot: &TreeSnapshot) -> String {
    let mut children: Children<'_> = BTreeMap::new();
    for (path, entry) in snapshot.iter() {
        children.entry(path.parent()).or_default().push((path, entry));
    }

    let mut lines = vec![format!("{}/", snapshot.root_name())];
    render_level(&children, &None, "", &mut lines);
    lines.join("\n")
}

fn render_level(
    children: &Children<'_>,
    parent: &Option<RelPath>,
    prefix: &str,
    lines: &mut Vec<String>,
) {
    let Some(items) = children.get(parent) else {
        return;
    };
    let (dirs, files): (Vec<_>, Vec<_>) = items
        .iter()
        .partition(|(_, entry)| entry.kind == EntryKind::Directory);
    let count = items.len();

    for (i, (path, entry)) in dirs.into_iter().chain(files).enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { "└── " } else { "├── " };
        if entry.kind == EntryKind::Directory {
            lines.push(format!("{}{}{}/", prefix, connector, path.name()));
            let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
            render_level(children, &Some((*path).clone()), &child_prefix, lines);
        } else {
            lines.push(format!("{}{}{}", prefix, connector, path.name()));
        }
    }
}
