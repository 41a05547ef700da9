use url::Url;
use url::form_urlencoded;

/// Query keys of a signed media reference, in the order the CDN issues them.
pub const MEDIA_REF_KEYS: [&str; 10] = [
    "faid",
    "file_id",
    "is_play_url",
    "item_id",
    "line",
    "ply_type",
    "signaturev3",
    "tk",
    "vidc",
    "video_id",
];

/// The signed parameter set the CDN needs to serve one media file.
///
/// Every field is opaque and may be empty. Values are never validated here;
/// the CDN is the only judge of whether a reference is good.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignedMediaRef {
    pub faid: String,
    pub file_id: String,
    pub is_play_url: String,
    pub item_id: String,
    pub line: String,
    pub ply_type: String,
    pub signaturev3: String,
    pub tk: String,
    pub vidc: String,
    pub video_id: String,
}

impl SignedMediaRef {
    /// Builds a reference from a urlencoded query string.
    ///
    /// Missing keys stay empty, unknown keys are ignored and the first
    /// occurrence of a repeated key wins.
    pub fn from_query(query: &str) -> Self {
        let mut media_ref = SignedMediaRef::default();
        let mut seen = [false; MEDIA_REF_KEYS.len()];

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let Some(index) = MEDIA_REF_KEYS.iter().position(|k| *k == key) else {
                continue;
            };
            if seen[index] {
                continue;
            }
            seen[index] = true;
            *media_ref.field_mut(index) = value.into_owned();
        }

        media_ref
    }

    /// Extracts the reference from a CDN media-play link.
    pub fn from_play_url(url: &Url) -> Self {
        Self::from_query(url.query().unwrap_or(""))
    }

    /// All ten key/value pairs in CDN order.
    pub fn pairs(&self) -> [(&'static str, &str); 10] {
        [
            (MEDIA_REF_KEYS[0], self.faid.as_str()),
            (MEDIA_REF_KEYS[1], self.file_id.as_str()),
            (MEDIA_REF_KEYS[2], self.is_play_url.as_str()),
            (MEDIA_REF_KEYS[3], self.item_id.as_str()),
            (MEDIA_REF_KEYS[4], self.line.as_str()),
            (MEDIA_REF_KEYS[5], self.ply_type.as_str()),
            (MEDIA_REF_KEYS[6], self.signaturev3.as_str()),
            (MEDIA_REF_KEYS[7], self.tk.as_str()),
            (MEDIA_REF_KEYS[8], self.vidc.as_str()),
            (MEDIA_REF_KEYS[9], self.video_id.as_str()),
        ]
    }

    /// Urlencoded query string with every key present, in CDN order.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }

    fn field_mut(&mut self, index: usize) -> &mut String {
        match index {
            0 => &mut self.faid,
            1 => &mut self.file_id,
            2 => &mut self.is_play_url,
            3 => &mut self.item_id,
            4 => &mut self.line,
            5 => &mut self.ply_type,
            6 => &mut self.signaturev3,
            7 => &mut self.tk,
            8 => &mut self.vidc,
            _ => &mut self.video_id,
        }
    }
}
