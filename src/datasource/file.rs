use crate::config::CsvOptions;
use crate::datasource::tree::ArrowTree;
use crate::datasource::{csv, ipc};
use crate::error::{Error, Result};
use crate::util::normalize_tree_path;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const IPC_EXTENSIONS: &[&str] = &["arrow", "ipc", "feather"];
const CSV_EXTENSIONS: &[&str] = &["csv", "txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Ipc,
    Csv,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if IPC_EXTENSIONS.contains(&extension.as_str()) {
            Some(Format::Ipc)
        } else if CSV_EXTENSIONS.contains(&extension.as_str()) {
            Some(Format::Csv)
        } else {
            None
        }
    }
}

#[derive(Debug)]
enum Container {
    /// A single file holding exactly one tree.
    File { path: PathBuf, format: Format, tree: String },
    /// A directory whose tree files are addressed by their relative path.
    Directory(PathBuf),
}

#[derive(Debug)]
/// An opened tree container: an Arrow IPC file, a CSV file or a directory of those.
pub struct TreeFile {
    locator: String,
    container: Container,
    csv: CsvOptions,
}

impl TreeFile {
    /// Opens the container at `locator` with default CSV options.
    pub fn open(locator: &str) -> Result<Self> {
        Self::open_with_options(locator, CsvOptions::default())
    }

    pub fn open_with_options(locator: &str, csv: CsvOptions) -> Result<Self> {
        let path = PathBuf::from(locator);
        let metadata = fs::metadata(&path).map_err(|e| Error::open_file(locator, e))?;

        let container = if metadata.is_dir() {
            Container::Directory(path)
        } else {
            let format = Format::of(&path)
                .ok_or_else(|| Error::open_file(locator, "unrecognized tree file format"))?;
            let tree = match format {
                Format::Ipc => {
                    let schema = ipc::read_schema(&path).map_err(|e| Error::open_file(locator, e))?;
                    ipc::tree_name(&schema, &path)
                }
                Format::Csv => {
                    fs::File::open(&path).map_err(|e| Error::open_file(locator, e))?;
                    file_stem(&path)
                }
            };
            Container::File { path, format, tree }
        };

        debug!(locator, "opened tree container");
        Ok(Self {
            locator: locator.to_string(),
            container,
            csv,
        })
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Paths of every tree this container can resolve.
    pub fn tree_names(&self) -> Result<Vec<String>> {
        match &self.container {
            Container::File { tree, .. } => Ok(vec![tree.clone()]),
            Container::Directory(root) => {
                let mut names = vec![];
                collect_tree_names(root, root, &mut names)?;
                names.sort();
                Ok(names)
            }
        }
    }

    /// Resolves `path` to a tree and loads it. Fails if nothing tree-compatible lives there.
    pub fn get(&self, path: &str) -> Result<ArrowTree> {
        let name = normalize_tree_path(path);
        let (file, format) = match &self.container {
            Container::File {
                path: file,
                format,
                tree,
            } => {
                if name != tree.as_str() {
                    return Err(Error::no_such_tree(path, format!("no tree named `{}` in file", name)));
                }
                (file.clone(), *format)
            }
            Container::Directory(root) => self.find_in_directory(root, path, name)?,
        };

        let tree = match format {
            Format::Ipc => ipc::read_tree(&file, name),
            Format::Csv => csv::read_tree(&file, name, &self.csv),
        };
        let tree = tree.map_err(|e| match e {
            Error::NoSuchTree { reason, .. } => Error::no_such_tree(path, reason),
            other => Error::no_such_tree(path, other),
        })?;

        debug!(locator = %self.locator, path, "resolved tree");
        Ok(tree)
    }

    fn find_in_directory(&self, root: &Path, path: &str, name: &str) -> Result<(PathBuf, Format)> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if name.is_empty() || escapes {
            return Err(Error::no_such_tree(path, "not a path inside the container"));
        }

        let direct = root.join(relative);
        if direct.is_file() {
            if let Some(format) = Format::of(&direct) {
                return Ok((direct, format));
            }
        }
        for extension in IPC_EXTENSIONS.iter().chain(CSV_EXTENSIONS) {
            let candidate = root.join(format!("{}.{}", name, extension));
            if candidate.is_file() {
                if let Some(format) = Format::of(&candidate) {
                    return Ok((candidate, format));
                }
            }
        }
        Err(Error::no_such_tree(path, "no such object"))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn collect_tree_names(root: &Path, dir: &Path, names: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_tree_names(root, &path, names)?;
        } else if Format::of(&path).is_some() {
            if let Ok(relative) = path.with_extension("").strip_prefix(root) {
                let parts = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>();
                names.push(parts.join("/"));
            }
        }
    }
    Ok(())
}
