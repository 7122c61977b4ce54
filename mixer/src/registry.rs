use spatial_core::ParticipantAudioData;

/// Authoritative table of participant audio data, kept in insertion order.
///
/// Rooms are small, so entries live in a `Vec` and lookups scan it; the
/// order doubles as the seat order used for layout.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    entries: Vec<ParticipantAudioData>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, participant_id: &str) -> bool {
        self.get(participant_id).is_some()
    }

    pub fn get(&self, participant_id: &str) -> Option<&ParticipantAudioData> {
        self.entries
            .iter()
            .find(|p| p.participant_id == participant_id)
    }

    pub fn get_mut(&mut self, participant_id: &str) -> Option<&mut ParticipantAudioData> {
        self.entries
            .iter_mut()
            .find(|p| p.participant_id == participant_id)
    }

    /// Insert a participant, replacing an entry with the same id in place.
    pub fn insert(&mut self, participant: ParticipantAudioData) {
        match self.get_mut(&participant.participant_id) {
            Some(existing) => *existing = participant,
            None => self.entries.push(participant),
        }
    }

    pub fn remove(&mut self, participant_id: &str) -> Option<ParticipantAudioData> {
        let index = self
            .entries
            .iter()
            .position(|p| p.participant_id == participant_id)?;
        Some(self.entries.remove(index))
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|p| p.participant_id.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParticipantAudioData> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ParticipantAudioData> {
        self.entries.iter_mut()
    }

    /// Remove and return every entry, leaving the registry empty.
    pub fn drain(&mut self) -> Vec<ParticipantAudioData> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
