use std::sync::LazyLock;

use regex::Regex;

/// Country suffix appended to every free-text query.
pub const COUNTRY: &str = "Azerbaijan";

static BUILDING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\d+[A-Za-z]?(/\d+)?$").expect("building number pattern is valid")
});

static STREET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([А-Яа-яƏəŞşÇçÜüÖöĞğİı\w\s]+(?:pros\.|pr\.|küç\.|küçəsi|prospekti))\s*\d*")
        .expect("street pattern is valid")
});

/// An Azerbaijani place name and the English spelling the geocoder knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityAlias {
    pub needles: &'static [&'static str],
    pub city: &'static str,
}

const fn alias(needles: &'static [&'static str], city: &'static str) -> CityAlias {
    CityAlias { needles, city }
}

/// Address rewriting rules for one bank's address style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressProfile {
    name: &'static str,
    replacements: &'static [(&'static str, &'static str)],
    cities: &'static [CityAlias],
}

// ' m\u{4d9}h.' is spelled with a Cyrillic schwa on the bank sites.
const AFB_REPLACEMENTS: &[(&str, &str)] = &[
    (" ş.", " şəhər"),
    (" r-nu", ""),
    (" r.", ""),
    (" küç.", " küçəsi"),
    (" pros.", " prospekti"),
    (" pr.", " prospekti"),
    (" m\u{4d9}h.", " məhəllə"),
    ("Bakı şəhər", "Baku"),
    ("Sumqayit şəhər", "Sumqayit"),
    ("Gəncə şəhər", "Ganja"),
    ("Qəbələ şəhər", "Qabala"),
];

const AFB_CITIES: &[CityAlias] = &[
    alias(&["Bakı", "Baku"], "Baku"),
    alias(&["Sumqayit"], "Sumqayit"),
    alias(&["Gəncə", "Ganja"], "Ganja"),
    alias(&["Qəbələ", "Qabala"], "Qabala"),
];

const TURAN_REPLACEMENTS: &[(&str, &str)] = &[
    (" ş.", " şəhər"),
    (" şəh.", " şəhər"),
    (" r-nu", ""),
    (" r.", ""),
    (" küç.", " küçəsi"),
    (" pros.", " prospekti"),
    (" pr.", " prospekti"),
    (" m\u{4d9}h.", " məhəllə"),
    ("Bakı şəhər", "Baku"),
    ("Sumqayıt şəhər", "Sumqayit"),
    ("Gəncə şəhər", "Ganja"),
    ("Qəbələ şəhər", "Qabala"),
    ("Zaqatala şəhər", "Zagatala"),
    ("Tovuz şəhər", "Tovuz"),
    ("Ağstafa şəhər", "Agstafa"),
    ("Xaçmaz şəhər", "Khachmaz"),
    ("Cəlilabad şəhər", "Jalilabad"),
    ("Ağcabədi şəhər", "Aghjabadi"),
    ("Göyçay şəhər", "Goychay"),
    ("Qazax şəhər", "Gazakh"),
    ("Xırdalan şəhər", "Khirdalan"),
];

const TURAN_CITIES: &[CityAlias] = &[
    alias(&["Bakı", "Baku"], "Baku"),
    alias(&["Sumqayıt"], "Sumqayit"),
    alias(&["Gəncə", "Ganja"], "Ganja"),
    alias(&["Zaqatala"], "Zagatala"),
    alias(&["Tovuz"], "Tovuz"),
    alias(&["Ağstafa"], "Agstafa"),
    alias(&["Xaçmaz"], "Khachmaz"),
    alias(&["Cəlilabad"], "Jalilabad"),
    alias(&["Ağcabədi"], "Aghjabadi"),
    alias(&["Göyçay"], "Goychay"),
    alias(&["Qazax"], "Gazakh"),
    alias(&["Xırdalan"], "Khirdalan"),
    alias(&["Lökbatan"], "Lokbatan"),
];

impl AddressProfile {
    pub const AFB: Self = Self {
        name: "afb",
        replacements: AFB_REPLACEMENTS,
        cities: AFB_CITIES,
    };

    pub const TURAN: Self = Self {
        name: "turan",
        replacements: TURAN_REPLACEMENTS,
        cities: TURAN_CITIES,
    };

    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Expands abbreviations and swaps known city names, in table order.
    pub fn normalize(&self, address: &str) -> String {
        self.replacements
            .iter()
            .fold(address.to_owned(), |text, (from, to)| text.replace(from, to))
    }

    /// Normalized address with the country appended.
    pub fn query(&self, address: &str) -> String {
        format!("{}, {COUNTRY}", self.normalize(address))
    }

    /// First city whose spelling appears in the raw address.
    pub fn detect_city(&self, address: &str) -> Option<&'static str> {
        self.cities
            .iter()
            .find(|alias| alias.needles.iter().any(|needle| address.contains(needle)))
            .map(|alias| alias.city)
    }
}

/// Address without its trailing building number, or `None` when there is
/// nothing to strip.
pub fn strip_building_number(address: &str) -> Option<String> {
    let stripped = BUILDING_NUMBER.replace(address, "");
    (stripped != address).then(|| stripped.into_owned())
}

/// The street phrase (ending in a street or avenue marker) of an address.
pub fn extract_street(address: &str) -> Option<String> {
    STREET
        .captures(address)
        .and_then(|captures| captures.get(1))
        .map(|street| street.as_str().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn afb_profile_expands_abbreviations_and_city_names() {
        let normalized = AddressProfile::AFB.normalize("Bakı ş., Nəsimi r., Füzuli küç. 49");
        assert_eq!(normalized, "Baku, Nəsimi, Füzuli küçəsi 49");
    }

    #[test]
    fn turan_profile_knows_the_long_city_abbreviation() {
        assert_eq!(
            AddressProfile::TURAN.query("Zaqatala şəh., Heydər Əliyev pr. 3"),
            "Zagatala, Heydər Əliyev prospekti 3, Azerbaijan"
        );
    }

    #[test]
    fn cyrillic_schwa_quarter_abbreviation_is_expanded() {
        let normalized = AddressProfile::AFB.normalize("Gəncə ş., 5 m\u{4d9}h.");
        assert_eq!(normalized, "Ganja, 5 məhəllə");
    }

    #[test]
    fn city_detection_uses_profile_table_order() {
        assert_eq!(AddressProfile::AFB.detect_city("Baku, Sumqayit yolu"), Some("Baku"));
        assert_eq!(AddressProfile::TURAN.detect_city("Lökbatan qəs."), Some("Lokbatan"));
        assert_eq!(AddressProfile::AFB.detect_city("Lökbatan qəs."), None);
    }

    #[test]
    fn building_number_is_stripped_only_when_present() {
        assert_eq!(
            strip_building_number("Nizami küç. 12A/3").as_deref(),
            Some("Nizami küç.")
        );
        assert_eq!(strip_building_number("Nizami küç."), None);
    }

    #[test]
    fn street_phrase_ends_at_the_marker() {
        assert_eq!(
            extract_street("Bakı ş., Nizami küç. 12").as_deref(),
            Some(" Nizami küç.")
        );
        assert_eq!(extract_street("Gəncə, mərkəz"), None);
    }
}
