use std::fmt::{self, Display};

/// 需要配图的对象
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSubject {
    Artist { name: String },
    Track { name: String, artist: String },
}

impl ImageSubject {
    pub fn artist(name: impl Into<String>) -> Self {
        ImageSubject::Artist { name: name.into() }
    }

    pub fn track(name: impl Into<String>, artist: impl Into<String>) -> Self {
        ImageSubject::Track {
            name: name.into(),
            artist: artist.into(),
        }
    }

    /// 缓存键：`artist:<name>` 或 `track:<name>:<artist>`
    ///
    /// 分量中的 `\` 和 `:` 会被转义，不同对象的键不会冲突。
    pub fn cache_key(&self) -> String {
        match self {
            ImageSubject::Artist { name } => format!("artist:{}", escape(name)),
            ImageSubject::Track { name, artist } => {
                format!("track:{}:{}", escape(name), escape(artist))
            }
        }
    }

    /// 搜索关键词
    pub fn search_term(&self) -> String {
        match self {
            ImageSubject::Artist { name } => name.clone(),
            ImageSubject::Track { name, artist } => format!("{} {}", name, artist),
        }
    }
}

impl Display for ImageSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSubject::Artist { name } => write!(f, "artist {}", name),
            ImageSubject::Track { name, artist } => write!(f, "track {} by {}", name, artist),
        }
    }
}

fn escape(component: &str) -> String {
    let mut escaped = String::with_capacity(component.len());
    for c in component.chars() {
        if c == '\\' || c == ':' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
