//! Folder path navigation
//!
//! Pure string logic: no file-system access, never fails. Malformed input
//! passes through unchanged and downstream I/O reports the problem.

/// Separator convention of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// `\` separated, drive roots like `C:\` (`/` is accepted when reading)
    Windows,
    /// `/` separated, single root `/`
    Posix,
}

impl PathStyle {
    pub fn native() -> Self {
        if cfg!(windows) {
            PathStyle::Windows
        } else {
            PathStyle::Posix
        }
    }

    pub fn separator(self) -> char {
        match self {
            PathStyle::Windows => '\\',
            PathStyle::Posix => '/',
        }
    }

    fn is_separator(self, c: char) -> bool {
        match self {
            PathStyle::Windows => c == '\\' || c == '/',
            PathStyle::Posix => c == '/',
        }
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::native()
    }
}

/// Resolves parent/child folder transitions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathResolver {
    style: PathStyle,
}

impl PathResolver {
    pub fn new(style: PathStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> PathStyle {
        self.style
    }

    /// Parent folder; volume roots are their own parent
    pub fn parent_of(&self, path: &str) -> String {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return path.to_string();
        }
        if self.is_root(trimmed) {
            return self.root_form(trimmed);
        }

        let body = trimmed.trim_end_matches(|c| self.style.is_separator(c));
        let Some(last_sep) = body.rfind(|c| self.style.is_separator(c)) else {
            return path.to_string();
        };

        let head = &body[..last_sep];
        match self.style {
            PathStyle::Windows if is_drive(head) => format!("{}\\", head),
            _ if head.is_empty() => body[..=last_sep].to_string(),
            _ => head.to_string(),
        }
    }

    /// Child folder or file path, joined with exactly one separator
    pub fn child_of(&self, path: &str, name: &str) -> String {
        let base = path.trim().trim_end_matches(|c| self.style.is_separator(c));
        format!("{}{}{}", base, self.style.separator(), name)
    }

    /// Whether `path` is a volume root (`C:\`, `C:`, `/`)
    pub fn is_root(&self, path: &str) -> bool {
        let trimmed = path.trim();
        match self.style {
            PathStyle::Windows => is_drive(trimmed.trim_end_matches(['\\', '/'])),
            PathStyle::Posix => !trimmed.is_empty() && trimmed.chars().all(|c| c == '/'),
        }
    }

    /// Whether navigating up from `path` changes anything
    pub fn can_go_up(&self, path: &str) -> bool {
        self.parent_of(path) != path
    }

    /// Separator-terminated prefix covering every child of `path`
    pub fn folder_prefix(&self, path: &str) -> String {
        let base = path.trim().trim_end_matches(|c| self.style.is_separator(c));
        format!("{}{}", base, self.style.separator())
    }

    fn root_form(&self, root: &str) -> String {
        match self.style {
            PathStyle::Windows if root.len() == 2 => root.to_string(),
            PathStyle::Windows => format!("{}\\", &root[..2]),
            PathStyle::Posix => "/".to_string(),
        }
    }
}

/// `X:` drive designator
fn is_drive(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
