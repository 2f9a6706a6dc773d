//! FEN parsing and normalization helpers on top of shakmaty.

use shakmaty::{fen::Fen, CastlingMode, Chess, EnPassantMode};

use crate::moves::MoveError;

/// Parse a FEN string into a standard chess position.
pub fn parse_position(fen: &str) -> Result<Chess, MoveError> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| MoveError::InvalidFen {
            fen: fen.to_string(),
            reason: format!("{e}"),
        })?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| MoveError::InvalidFen {
            fen: fen.to_string(),
            reason: format!("{e}"),
        })
}

/// Render a position back to FEN (en passant square only when legal).
pub fn position_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Strips move counters from FEN, keeping only position + side + castling + ep.
///
/// Two seeds that reach the same position through different move orders
/// normalize to the same key.
pub fn normalize_fen(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_normalize_fen_drops_counters() {
        assert_eq!(
            normalize_fen(START),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"
        );
        assert_eq!(
            normalize_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 4 17"),
            normalize_fen(START)
        );
    }

    #[test]
    fn test_parse_and_render_start_position() {
        let pos = parse_position(START).unwrap();
        assert_eq!(position_fen(&pos), START);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_position("not a fen").unwrap_err();
        assert!(matches!(err, MoveError::InvalidFen { .. }));
    }
}
