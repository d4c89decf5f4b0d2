// Cross-source player identity resolution.
//
// Player lists from different providers never share a clean join key: names
// are transliterated, hyphenated, truncated or mangled by encoding round
// trips. Matching therefore works on normalized name parts and falls back
// through progressively looser rules, but always requires the same club.

/// Anything that carries a player's name parts and club.
pub trait NameRecord {
    fn first_name(&self) -> &str;
    fn last_name(&self) -> &str;
    fn club(&self) -> &str;
}

/// Lower-case and drop everything that is not an ASCII letter or digit.
///
/// "Özil", "?zil" (a lossy ASCII export) and "zil" all normalize to "zil";
/// "N'Zogbia" and "N Zogbia" both become "nzogbia".
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalized name parts of a record, computed once per comparison side.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NormalizedName {
    first: String,
    last: String,
    club: String,
}

impl NormalizedName {
    fn of<R: NameRecord + ?Sized>(record: &R) -> Self {
        NormalizedName {
            first: normalize(record.first_name()),
            last: normalize(record.last_name()),
            club: normalize(record.club()),
        }
    }

    fn initial(&self) -> Option<char> {
        self.first.chars().next()
    }
}

/// Decide whether `entry` refers to the same player as `candidate`.
///
/// Club agreement is mandatory. After that the first satisfied rule wins:
/// 1. first and last names equal;
/// 2. last names equal and the candidate has no first name;
/// 3. first names equal and the candidate has no last name;
/// 4. last names equal and first-name initials equal.
fn names_agree(candidate: &NormalizedName, entry: &NormalizedName) -> bool {
    if candidate.club != entry.club {
        return false;
    }

    let same_first = candidate.first == entry.first;
    let same_last = candidate.last == entry.last;

    (same_first && same_last)
        || (same_last && candidate.first.is_empty())
        || (same_first && candidate.last.is_empty())
        || (same_last && candidate.initial().is_some() && candidate.initial() == entry.initial())
}

/// Whether `entry` is an acceptable match for `candidate`.
pub fn is_match<C, E>(candidate: &C, entry: &E) -> bool
where
    C: NameRecord + ?Sized,
    E: NameRecord + ?Sized,
{
    names_agree(&NormalizedName::of(candidate), &NormalizedName::of(entry))
}

/// Return the first pool entry matching `candidate`, scanning left to right.
///
/// Ties between equally valid entries go to the earlier one. An empty pool
/// or a pool without an acceptable entry yields `None`.
pub fn find_match<'a, C, T>(candidate: &C, pool: &'a [T]) -> Option<&'a T>
where
    C: NameRecord + ?Sized,
    T: NameRecord,
{
    let wanted = NormalizedName::of(candidate);
    pool.iter()
        .find(|entry| names_agree(&wanted, &NormalizedName::of(*entry)))
}

/// Whether any pool entry matches `candidate`.
pub fn contains<C, T>(pool: &[T], candidate: &C) -> bool
where
    C: NameRecord + ?Sized,
    T: NameRecord,
{
    find_match(candidate, pool).is_some()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Name {
        first: &'static str,
        last: &'static str,
        club: &'static str,
        tag: u32,
    }

    impl NameRecord for Name {
        fn first_name(&self) -> &str {
            self.first
        }
        fn last_name(&self) -> &str {
            self.last
        }
        fn club(&self) -> &str {
            self.club
        }
    }

    fn name(first: &'static str, last: &'static str, club: &'static str, tag: u32) -> Name {
        Name {
            first,
            last,
            club,
            tag,
        }
    }

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("N'Zogbia"), "nzogbia");
        assert_eq!(normalize("Oxlade-Chamberlain"), "oxladechamberlain");
        assert_eq!(normalize("Özil"), "zil");
        assert_eq!(normalize("?zil"), "zil");
        assert_eq!(normalize("Man City"), "mancity");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn empty_pool_yields_none() {
        let candidate = name("Mesut", "Ozil", "ARS", 0);
        let pool: Vec<Name> = vec![];
        assert!(find_match(&candidate, &pool).is_none());
    }

    #[test]
    fn exact_names_match() {
        let candidate = name("Mesut", "Özil", "ARS", 0);
        let pool = vec![name("Theo", "Walcott", "ARS", 1), name("mesut", "?zil", "Ars.", 2)];
        assert_eq!(find_match(&candidate, &pool).map(|n| n.tag), Some(2));
    }

    #[test]
    fn club_mismatch_disqualifies_identical_names() {
        let candidate = name("Danny", "Rose", "TOT", 0);
        let pool = vec![name("Danny", "Rose", "NEW", 1)];
        assert!(find_match(&candidate, &pool).is_none());
        assert!(!is_match(&candidate, &pool[0]));
    }

    #[test]
    fn missing_candidate_first_name_matches_on_last_name() {
        let candidate = name("", "Fernandinho", "MCI", 0);
        let pool = vec![name("Fernando", "Roza", "MCI", 1), name("Luiz", "Fernandinho", "MCI", 2)];
        assert_eq!(find_match(&candidate, &pool).map(|n| n.tag), Some(2));
    }

    #[test]
    fn missing_candidate_last_name_matches_on_first_name() {
        let candidate = name("Oscar", "", "CHE", 0);
        let pool = vec![name("Oscar", "dos Santos Emboaba", "CHE", 1)];
        assert_eq!(find_match(&candidate, &pool).map(|n| n.tag), Some(1));
    }

    #[test]
    fn initial_and_last_name_match() {
        let candidate = name("Alex", "Oxlade-Chamberlain", "ARS", 0);
        let pool = vec![name("A.", "Oxlade Chamberlain", "ARS", 1)];
        assert_eq!(find_match(&candidate, &pool).map(|n| n.tag), Some(1));
    }

    #[test]
    fn different_initials_do_not_match() {
        let candidate = name("Gary", "Neville", "MUN", 0);
        let pool = vec![name("Phil", "Neville", "MUN", 1)];
        assert!(find_match(&candidate, &pool).is_none());
    }

    #[test]
    fn entry_without_first_name_needs_exact_rule() {
        // Candidate has a first name, entry does not: no initial to compare.
        let candidate = name("Luis", "Suarez", "LIV", 0);
        let pool = vec![name("", "Suarez", "LIV", 1)];
        assert!(find_match(&candidate, &pool).is_none());
    }

    #[test]
    fn first_acceptable_entry_wins() {
        let candidate = name("Ashley", "Cole", "CHE", 0);
        let pool = vec![
            name("Joe", "Cole", "CHE", 1),
            name("A", "Cole", "CHE", 2),
            name("Ashley", "Cole", "CHE", 3),
        ];
        // Entry 2 satisfies the initial rule before the exact entry is seen.
        assert_eq!(find_match(&candidate, &pool).map(|n| n.tag), Some(2));
        // Deterministic across calls.
        assert_eq!(find_match(&candidate, &pool).map(|n| n.tag), Some(2));
    }

    #[test]
    fn contains_reports_membership() {
        let pool = vec![name("Yaya", "Toure", "MCI", 1)];
        assert!(!contains(&pool, &name("YAYA", "Toure", "Man City", 0)));
        assert!(contains(&pool, &name("YAYA", "TOURE", "mci", 0)));
        assert!(!contains(&pool, &name("Kolo", "Toure", "LIV", 0)));
    }
}
