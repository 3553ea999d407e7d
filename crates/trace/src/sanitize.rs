/// Reversible actor-name substitution applied at the renderer boundary.
///
/// The mermaid sequence grammar cannot represent dashes in participant
/// names, while cell and service names use them freely. Encoding swaps the
/// disallowed character for a safe one; names coming back from the renderer
/// (e.g. from a clicked label) are decoded with the inverse substitution.
/// Decoding is only lossless while source names never contain the
/// replacement character, which holds for mesh instance names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorNameCodec {
    disallowed: char,
    replacement: char,
}

impl Default for ActorNameCodec {
    fn default() -> Self {
        Self {
            disallowed: '-',
            replacement: '_',
        }
    }
}

impl ActorNameCodec {
    pub fn new(disallowed: char, replacement: char) -> Self {
        Self {
            disallowed,
            replacement,
        }
    }

    pub fn encode(&self, name: &str) -> String {
        name.replace(self.disallowed, &self.replacement.to_string())
    }

    pub fn decode(&self, name: &str) -> String {
        name.replace(self.replacement, &self.disallowed.to_string())
    }
}
