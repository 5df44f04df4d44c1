/// Raw audio returned by one successful remote synthesis call
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    pub data: Vec<u8>,
    /// Media type as reported by the provider, e.g. `audio/L16;codec=pcm;rate=24000`
    pub mime_type: String,
}
