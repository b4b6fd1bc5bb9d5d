/// The fixed set of keys owned by the app. `Storage::clear` wipes exactly these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Profile,
    Jobs,
    Variants,
    Settings,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::Profile,
        StorageKey::Jobs,
        StorageKey::Variants,
        StorageKey::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Profile => "rolefit_profile",
            StorageKey::Jobs => "rolefit_jobs",
            StorageKey::Variants => "rolefit_variants",
            StorageKey::Settings => "rolefit_settings",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
