//! Title normalization and fuzzy matching.
//!
//! Shortcut file names, user-edited titles, and provider catalog names all
//! spell the same game slightly differently ("Deus Ex: GOTY" vs
//! "Deus Ex - Game of the Year Edition"). Candidates are compared on a
//! normalized form scored by Damerau–Levenshtein edit distance.

/// Reduce a title to its comparable core: lowercase, `&` and the word
/// `" and "` removed, every non-alphanumeric character dropped, `ü`
/// folded to `u`.
///
/// # Examples
///
/// ```
/// use gameshelf::matching::normalize;
///
/// assert_eq!(normalize("Assassin's Creed™ IV: Black Flag"), "assassinscreedivblackflag");
/// assert_eq!(normalize("Ori & the Blind Forest"), "oritheblindforest");
/// ```
pub fn normalize(title: &str) -> String {
    title
        .to_lowercase()
        .replace('&', "")
        .replace(" and ", "")
        .chars()
        .filter(|c| c.is_alphanumeric())
        .map(|c| if c == 'ü' { 'u' } else { c })
        .collect()
}

/// Damerau–Levenshtein edit distance between two strings: insertions,
/// deletions, substitutions, and adjacent transpositions, unit cost each.
///
/// Symmetric, zero for equal inputs. Callers compare against the length of
/// the normalized local title: a candidate is only a plausible match when
/// its distance is strictly below that length.
pub fn edit_distance(original: &str, modified: &str) -> usize {
    let a: Vec<char> = original.chars().collect();
    let b: Vec<char> = modified.chars().collect();
    let (n, m) = (a.len(), b.len());

    // (n+1) x (m+1) cost matrix, flattened row-major.
    let w = m + 1;
    let mut matrix = vec![0usize; (n + 1) * w];
    for i in 0..=n {
        matrix[i * w] = i;
    }
    for j in 0..=m {
        matrix[j] = j;
    }

    for i in 1..=n {
        for j in 1..=m {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (matrix[(i - 1) * w + j] + 1)
                .min(matrix[i * w + j - 1] + 1)
                .min(matrix[(i - 1) * w + j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(matrix[(i - 2) * w + j - 2] + cost);
            }
            matrix[i * w + j] = best;
        }
    }

    matrix[n * w + m]
}
