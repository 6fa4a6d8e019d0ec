//! Shared test support: an in-memory backend double standing in for an
//! image-filesystem collaborator, and a scripted prompt handler.

use std::collections::BTreeMap;

use engine::{
    Backend, BackendKind, ConflictChoice, Entry, ErrorCode, Files, FsCaps, OpError, OpResult,
    ParameterDescription, PromptHandler,
};

#[derive(Debug, Clone)]
pub enum Node {
    File(Vec<u8>),
    Dir(BTreeMap<String, Node>),
}

/// In-memory backend with configurable kind, capabilities and failure
/// injection. Entry metadata carries the slash-joined path, so entries
/// resolve independently of the current directory, like real backends.
pub struct FakeFs {
    pub kind: BackendKind,
    pub caps: FsCaps,
    pub fail_trash: bool,
    pub put_not_implemented: bool,
    pub support_delete_dir: bool,
    pub mkdir_calls: usize,
    pub put_calls: usize,
    root: BTreeMap<String, Node>,
    cwd: Vec<String>,
    changed: bool,
}

impl FakeFs {
    pub fn new(kind: BackendKind) -> Self {
        FakeFs {
            kind,
            caps: FsCaps::all(),
            fail_trash: false,
            put_not_implemented: false,
            support_delete_dir: kind == BackendKind::Host,
            mkdir_calls: 0,
            put_calls: 0,
            root: BTreeMap::new(),
            cwd: Vec::new(),
            changed: false,
        }
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn add_dir(&mut self, path: &str) {
        let mut current = &mut self.root;
        for seg in segments(path) {
            current = match current
                .entry(seg)
                .or_insert_with(|| Node::Dir(BTreeMap::new()))
            {
                Node::Dir(children) => children,
                Node::File(_) => panic!("path component is a file"),
            };
        }
    }

    pub fn add_file(&mut self, path: &str, data: &[u8]) {
        let segs = segments(path);
        let (last, parent) = segs.split_last().expect("empty path");
        let mut current = &mut self.root;
        for seg in parent {
            current = match current
                .entry(seg.clone())
                .or_insert_with(|| Node::Dir(BTreeMap::new()))
            {
                Node::Dir(children) => children,
                Node::File(_) => panic!("path component is a file"),
            };
        }
        current.insert(last.clone(), Node::File(data.to_vec()));
    }

    pub fn exists(&self, path: &str) -> bool {
        self.node_at(&segments(path)).is_some()
    }

    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        match self.node_at(&segments(path))? {
            Node::File(data) => Some(data.clone()),
            Node::Dir(_) => None,
        }
    }

    /// Current-directory entries, without the parent pseudo-entry.
    pub fn entries(&mut self) -> Vec<Entry> {
        self.dir(false)
            .expect("listing failed")
            .into_iter()
            .filter(|e| !e.is_parent_ref())
            .collect()
    }

    fn children_at(&self, path: &[String]) -> Option<&BTreeMap<String, Node>> {
        let mut current = &self.root;
        for seg in path {
            match current.get(seg) {
                Some(Node::Dir(children)) => current = children,
                _ => return None,
            }
        }
        Some(current)
    }

    fn children_at_mut(&mut self, path: &[String]) -> Option<&mut BTreeMap<String, Node>> {
        let mut current = &mut self.root;
        for seg in path {
            match current.get_mut(seg) {
                Some(Node::Dir(children)) => current = children,
                _ => return None,
            }
        }
        Some(current)
    }

    fn node_at(&self, path: &[String]) -> Option<&Node> {
        let (last, parent) = path.split_last()?;
        self.children_at(parent)?.get(last)
    }

    fn entry_segments(&self, entry: &Entry) -> Vec<String> {
        if entry.metadata.is_empty() {
            let mut segs = self.cwd.clone();
            segs.push(entry.name.clone());
            segs
        } else {
            segments(&String::from_utf8_lossy(&entry.metadata))
        }
    }
}

fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn make_entry(path: &[String], name: &str, node: &Node) -> Entry {
    Entry {
        name: name.to_string(),
        is_dir: matches!(node, Node::Dir(_)),
        is_deleted: false,
        type_preferred: String::new(),
        size: match node {
            Node::File(data) => data.len() as u64,
            Node::Dir(_) => 0,
        },
        mtime: None,
        metadata: path.join("/").into_bytes(),
    }
}

impl Backend for FakeFs {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn caps(&self) -> FsCaps {
        self.caps
    }

    fn cd(&mut self, entry: &Entry) {
        if entry.is_parent_ref() {
            self.cd_up();
            return;
        }
        let segs = self.entry_segments(entry);
        if matches!(self.node_at(&segs), Some(Node::Dir(_))) {
            self.cwd = segs;
        }
    }

    fn cd_up(&mut self) {
        self.cwd.pop();
    }

    fn dir(&mut self, _include_deleted: bool) -> OpResult<Files> {
        let mut entries = Files::new();
        if !self.cwd.is_empty() {
            entries.push(Entry::parent_ref());
        }
        let children = self
            .children_at(&self.cwd)
            .ok_or_else(|| OpError::new(ErrorCode::ReadError))?;
        for (name, node) in children {
            let mut path = self.cwd.clone();
            path.push(name.clone());
            entries.push(make_entry(&path, name, node));
        }
        Ok(entries)
    }

    fn get_file(&mut self, entry: &Entry, format_id: &str) -> OpResult<Vec<u8>> {
        let segs = self.entry_segments(entry);
        let data = match self.node_at(&segs) {
            Some(Node::File(data)) => data.clone(),
            _ => return Err(OpError::new(ErrorCode::ReadError)),
        };
        match format_id {
            "" | "plain" => Ok(data),
            "with-header" => {
                let mut out = format!("#export:{}\n", entry.name).into_bytes();
                out.extend_from_slice(&data);
                Ok(out)
            }
            _ => Err(OpError::new(ErrorCode::NotImplementedYet)),
        }
    }

    fn put_file(
        &mut self,
        entry: &Entry,
        _format_id: &str,
        data: &[u8],
        force_overwrite: bool,
    ) -> OpResult<()> {
        self.put_calls += 1;
        if self.put_not_implemented {
            return Err(OpError::new(ErrorCode::NotImplementedYet));
        }
        let cwd = self.cwd.clone();
        let children = self
            .children_at_mut(&cwd)
            .ok_or_else(|| OpError::new(ErrorCode::WriteError))?;
        if children.contains_key(&entry.name) && !force_overwrite {
            return Err(OpError::new(ErrorCode::FileAlreadyExists));
        }
        children.insert(entry.name.clone(), Node::File(data.to_vec()));
        self.changed = true;
        Ok(())
    }

    fn mkdir(&mut self, name: &str) -> OpResult<Entry> {
        self.mkdir_calls += 1;
        let cwd = self.cwd.clone();
        let children = self
            .children_at_mut(&cwd)
            .ok_or_else(|| OpError::new(ErrorCode::DirError))?;
        if children.contains_key(name) {
            return Err(OpError::new(ErrorCode::DirAlreadyExists));
        }
        children.insert(name.to_string(), Node::Dir(BTreeMap::new()));
        self.changed = true;
        let mut path = cwd;
        path.push(name.to_string());
        Ok(Entry {
            name: name.to_string(),
            is_dir: true,
            is_deleted: false,
            type_preferred: String::new(),
            size: 0,
            mtime: None,
            metadata: path.join("/").into_bytes(),
        })
    }

    fn delete_file(&mut self, entry: &Entry, use_trash: bool) -> OpResult<()> {
        if use_trash && self.fail_trash {
            return Err(OpError::trash_failed("simulated trash failure"));
        }
        let segs = self.entry_segments(entry);
        let (last, parent) = match segs.split_last() {
            Some(split) => split,
            None => return Err(OpError::new(ErrorCode::DeleteError)),
        };
        let (last, parent) = (last.clone(), parent.to_vec());
        let children = self
            .children_at_mut(&parent)
            .ok_or_else(|| OpError::new(ErrorCode::DeleteError))?;
        children
            .remove(&last)
            .ok_or_else(|| OpError::new(ErrorCode::DeleteError))?;
        self.changed = true;
        Ok(())
    }

    fn delete_dir(&mut self, entry: &Entry, use_trash: bool) -> OpResult<()> {
        if !self.support_delete_dir {
            return Err(OpError::new(ErrorCode::NotImplementedYet));
        }
        self.delete_file(entry, use_trash)
    }

    fn rename_file(&mut self, entry: &Entry, new_name: &str) -> OpResult<()> {
        let segs = self.entry_segments(entry);
        let (last, parent) = match segs.split_last() {
            Some(split) => (split.0.clone(), split.1.to_vec()),
            None => return Err(OpError::new(ErrorCode::RenameError)),
        };
        let children = self
            .children_at_mut(&parent)
            .ok_or_else(|| OpError::new(ErrorCode::RenameError))?;
        if children.contains_key(new_name) {
            return Err(OpError::new(ErrorCode::FileAlreadyExists));
        }
        let node = children
            .remove(&last)
            .ok_or_else(|| OpError::new(ErrorCode::RenameError))?;
        children.insert(new_name.to_string(), node);
        self.changed = true;
        Ok(())
    }

    fn get_changed(&self) -> bool {
        self.changed
    }

    fn reset_changed(&mut self) {
        self.changed = false;
    }

    fn save_file_formats(&self) -> Vec<String> {
        match self.kind {
            BackendKind::Image => vec!["plain".to_string(), "with-header".to_string()],
            BackendKind::Host => Vec::new(),
        }
    }

    fn file_info(&mut self, entry: &Entry) -> String {
        format!("{}: {} bytes", entry.name, entry.size)
    }

    fn file_get_metadata(&mut self, _entry: &Entry) -> Vec<ParameterDescription> {
        Vec::new()
    }

    fn file_set_metadata(&mut self, _entry: &Entry, _values: &[String]) -> OpResult<()> {
        Err(OpError::new(ErrorCode::NotImplementedYet))
    }
}

/// Prompt handler answering from fixed choices and recording every call.
pub struct ScriptedPrompts {
    pub conflict: ConflictChoice,
    pub continue_on_mkdir_failure: bool,
    pub recursive: bool,
    pub permanent: bool,
    pub calls: Vec<String>,
}

impl ScriptedPrompts {
    pub fn new() -> Self {
        ScriptedPrompts {
            conflict: ConflictChoice::Skip,
            continue_on_mkdir_failure: true,
            recursive: false,
            permanent: false,
            calls: Vec::new(),
        }
    }
}

impl PromptHandler for ScriptedPrompts {
    fn resolve_conflict(&mut self, name: &str) -> ConflictChoice {
        self.calls.push(format!("conflict({name})"));
        self.conflict
    }

    fn continue_after_mkdir_failure(&mut self, name: &str, _error: &str) -> bool {
        self.calls.push(format!("mkdir_failure({name})"));
        self.continue_on_mkdir_failure
    }

    fn confirm_recursive_delete(&mut self, name: &str) -> bool {
        self.calls.push(format!("recursive({name})"));
        self.recursive
    }

    fn confirm_permanent_delete(&mut self, name: &str) -> bool {
        self.calls.push(format!("permanent({name})"));
        self.permanent
    }
}
