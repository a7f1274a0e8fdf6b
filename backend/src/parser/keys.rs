//! Header and field-name canonicalization.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lower-case `text` and strip diacritics (NFD, then drop combining marks).
///
/// Everything else is kept, so `"Em Análise"` folds to `"em analise"`.
pub fn fold_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Canonical key for heuristic matching: [`fold_text`] and then drop every
/// character outside `[a-z0-9]`.
///
/// `"Data de Nascimento"`, `"data_de_nascimento"` and `"DATA DE NASCIMENTO"`
/// all become `"datadenascimento"`. Normalizing twice is the same as
/// normalizing once.
pub fn normalize_key(key: &str) -> String {
    fold_text(key)
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_accents_and_spaces() {
        assert_eq!(normalize_key("Data de Nascimento"), "datadenascimento");
        assert_eq!(normalize_key("Endereço"), "endereco");
        assert_eq!(normalize_key("Situação"), "situacao");
        assert_eq!(normalize_key("Nº Turma"), "nturma");
    }

    #[test]
    fn test_normalize_punctuation() {
        assert_eq!(normalize_key("\"cod_inep\""), "codinep");
        assert_eq!(normalize_key("Cód. Turma (ID)"), "codturmaid");
        assert_eq!(normalize_key(""), "");
        assert_eq!(normalize_key("---"), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let samples = [
            "Nome do Aluno",
            "ÁÉÍÓÚ ãõ ç",
            "Identificação única",
            "latitude;longitude",
            "İstanbul",
            "ﬁeld",
            "  ",
        ];
        for sample in samples {
            let once = normalize_key(sample);
            assert_eq!(normalize_key(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_fold_keeps_separators() {
        assert_eq!(fold_text("Em Análise"), "em analise");
        assert_eq!(fold_text("Pré-Escola"), "pre-escola");
    }
}
