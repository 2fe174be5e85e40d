//! The move tree of a game.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt, mem,
    num::NonZeroU32,
    slice,
};

use shakmaty::{
    san::{San, SanError, SanPlus},
    CastlingMode, Chess, Color, EnPassantMode, FromSetup, Move, Position, Setup,
};

use crate::nag::Nag;

/// NAGs, tags and comment attached to a node or to the start of a
/// variation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Annotations {
    nags: BTreeSet<Nag>,
    tags: BTreeMap<String, String>,
    comment: Option<String>,
    long_comment: bool,
}

impl Annotations {
    /// The set of NAGs, in ascending order of their codes.
    pub fn nags(&self) -> &BTreeSet<Nag> {
        &self.nags
    }

    pub fn has_nag(&self, nag: Nag) -> bool {
        self.nags.contains(&nag)
    }

    /// Value of a `[%key value]` tag.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Whether the comment is separated from the preceding move text by a
    /// blank line.
    pub fn is_long_comment(&self) -> bool {
        self.long_comment
    }

    pub fn is_empty(&self) -> bool {
        self.nags.is_empty() && self.tags.is_empty() && self.comment.is_none()
    }

    pub(crate) fn add_nag(&mut self, nag: Nag) {
        self.nags.insert(nag);
    }

    pub(crate) fn set_tag(&mut self, key: String, value: String) {
        self.tags.insert(key, value);
    }

    /// Replaces the comment. A later comment wins, even if it only
    /// consisted of directives.
    pub(crate) fn set_comment(&mut self, comment: Option<String>, long: bool) {
        self.long_comment = long && comment.is_some();
        self.comment = comment;
    }
}

/// A sequence of moves starting from a given position.
///
/// Cloning, comparing and dropping do not recurse, so arbitrarily deep
/// nesting of variations is fine.
#[derive(Debug)]
pub struct Variation {
    initial: Chess,
    nodes: Vec<Node>,
    annotations: Annotations,
    long: bool,
}

impl Variation {
    pub(crate) fn new(initial: Chess, long: bool) -> Variation {
        Variation {
            initial,
            nodes: Vec::new(),
            annotations: Annotations::default(),
            long,
        }
    }

    /// Position before the first move.
    pub fn initial_position(&self) -> &Chess {
        &self.initial
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn iter(&self) -> slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position after the last move, or the initial position if there are
    /// no moves.
    pub fn final_position(&self) -> &Chess {
        self.nodes.last().map_or(&self.initial, |node| &node.position)
    }

    /// Annotations placed before the first move.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Whether the variation is separated from the preceding move text by a
    /// blank line.
    pub fn is_long(&self) -> bool {
        self.long
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }

    pub(crate) fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }

    /// Position before the move at `index`.
    pub(crate) fn position_before(&self, index: usize) -> &Chess {
        match index.checked_sub(1) {
            Some(prev) => &self.nodes[prev].position,
            None => &self.initial,
        }
    }

    /// Copy without the child variations of the nodes.
    fn clone_shallow(&self) -> Variation {
        Variation {
            initial: self.initial.clone(),
            nodes: self.nodes.iter().map(Node::clone_shallow).collect(),
            annotations: self.annotations.clone(),
            long: self.long,
        }
    }

    fn eq_shallow(&self, other: &Variation) -> bool {
        self.long == other.long
            && setup_of(&self.initial) == setup_of(&other.initial)
            && self.annotations == other.annotations
            && self.nodes.len() == other.nodes.len()
            && self.nodes.iter().zip(&other.nodes).all(|(a, b)| a.eq_shallow(b))
    }
}

impl Clone for Variation {
    fn clone(&self) -> Variation {
        // Breadth first, so that every variation comes after its parent.
        let mut order: Vec<(usize, usize, &Variation)> = vec![(0, 0, self)];
        let mut i = 0;
        while i < order.len() {
            let (_, _, variation) = order[i];
            for (index, node) in variation.nodes.iter().enumerate() {
                order.extend(node.variations.iter().map(|child| (i, index, child)));
            }
            i += 1;
        }

        let mut copies: Vec<Option<Variation>> = order
            .iter()
            .map(|(_, _, variation)| Some(variation.clone_shallow()))
            .collect();

        // Children were attached in reverse, so restore the order of each
        // variation's alternatives before it is attached itself.
        for i in (0..order.len()).rev() {
            let Some(mut copy) = copies[i].take() else {
                continue;
            };
            for node in &mut copy.nodes {
                node.variations.reverse();
            }
            if i == 0 {
                return copy;
            }
            let (parent, index, _) = order[i];
            if let Some(node) = copies[parent]
                .as_mut()
                .and_then(|parent| parent.nodes.get_mut(index))
            {
                node.variations.push(copy);
            }
        }
        self.clone_shallow()
    }
}

impl PartialEq for Variation {
    fn eq(&self, other: &Variation) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if !a.eq_shallow(b) {
                return false;
            }
            for (x, y) in a.nodes.iter().zip(&b.nodes) {
                pending.extend(x.variations.iter().zip(&y.variations));
            }
        }
        true
    }
}

impl Drop for Variation {
    fn drop(&mut self) {
        let mut pending: Vec<Variation> = self
            .nodes
            .iter_mut()
            .flat_map(|node| mem::take(&mut node.variations))
            .collect();
        while let Some(mut variation) = pending.pop() {
            for node in &mut variation.nodes {
                pending.append(&mut node.variations);
            }
        }
    }
}

impl<'a> IntoIterator for &'a Variation {
    type Item = &'a Node;
    type IntoIter = slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A single ply.
#[derive(Clone)]
pub struct Node {
    san: SanPlus,
    m: Option<Move>,
    fullmoves: NonZeroU32,
    turn: Color,
    position: Chess,
    annotations: Annotations,
    variations: Vec<Variation>,
}

impl Node {
    /// Plays `notation` in `before`.
    ///
    /// A promotion may omit the `=` (`e8Q`). `--` is a null move, which is
    /// illegal if the side to move is in check.
    pub(crate) fn play(
        before: &Chess,
        notation: &str,
        mode: CastlingMode,
    ) -> Result<Node, SanError> {
        let san = parse_san(notation)?;
        let fullmoves = before.fullmoves();
        let turn = before.turn();

        let (san, m, position) = if san == San::Null {
            let position = play_null(before, mode)?;
            (
                SanPlus {
                    san: San::Null,
                    suffix: None,
                },
                None,
                position,
            )
        } else {
            let m = san.to_move(before)?;
            let mut position = before.clone();
            let san = SanPlus::from_move_and_play_unchecked(&mut position, &m);
            (san, Some(m), position)
        };

        Ok(Node {
            san,
            m,
            fullmoves,
            turn,
            position,
            annotations: Annotations::default(),
            variations: Vec::new(),
        })
    }

    /// Canonical notation of the move, with disambiguation and check
    /// suffix recomputed from the position.
    pub fn san(&self) -> &SanPlus {
        &self.san
    }

    /// The move, or `None` for a null move.
    pub fn get_move(&self) -> Option<&Move> {
        self.m.as_ref()
    }

    pub fn is_null(&self) -> bool {
        self.m.is_none()
    }

    /// Move number of this ply.
    pub fn fullmoves(&self) -> NonZeroU32 {
        self.fullmoves
    }

    /// Color of the player who made the move.
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// Position after the move.
    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Alternatives to this move, each starting from the position before
    /// it.
    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    pub(crate) fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }

    pub(crate) fn variations_mut(&mut self) -> &mut Vec<Variation> {
        &mut self.variations
    }

    fn clone_shallow(&self) -> Node {
        Node {
            san: self.san.clone(),
            m: self.m.clone(),
            fullmoves: self.fullmoves,
            turn: self.turn,
            position: self.position.clone(),
            annotations: self.annotations.clone(),
            variations: Vec::new(),
        }
    }

    /// Compares everything except the variations.
    fn eq_shallow(&self, other: &Node) -> bool {
        self.san == other.san
            && self.m == other.m
            && self.fullmoves == other.fullmoves
            && self.turn == other.turn
            && setup_of(&self.position) == setup_of(&other.position)
            && self.annotations == other.annotations
            && self.variations.len() == other.variations.len()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.eq_shallow(other)
            && self
                .variations
                .iter()
                .zip(&other.variations)
                .all(|(a, b)| a == b)
    }
}

// Variations are only counted, to keep the output of deep trees bounded.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("san", &self.san)
            .field("m", &self.m)
            .field("fullmoves", &self.fullmoves)
            .field("turn", &self.turn)
            .field("position", &self.position)
            .field("annotations", &self.annotations)
            .field("variations", &self.variations.len())
            .finish()
    }
}

fn setup_of(pos: &Chess) -> Setup {
    pos.clone().into_setup(EnPassantMode::Legal)
}

fn parse_san(notation: &str) -> Result<San, SanError> {
    let bytes = notation.as_bytes();
    let san = match promotion_without_equals(bytes) {
        Some(at) => {
            let mut fixed = Vec::with_capacity(bytes.len() + 1);
            fixed.extend_from_slice(&bytes[..at]);
            fixed.push(b'=');
            fixed.extend_from_slice(&bytes[at..]);
            San::from_ascii(&fixed)
        }
        None => San::from_ascii(bytes),
    };
    san.map_err(|_| SanError::IllegalSan)
}

/// Index of the promotion piece in a pawn move like `e8Q` or `exd1N+`.
fn promotion_without_equals(notation: &[u8]) -> Option<usize> {
    let end = notation
        .iter()
        .rposition(|&ch| !matches!(ch, b'+' | b'#'))?;
    match notation.get(..end) {
        Some([.., b'1'..=b'8']) if matches!(notation.first(), Some(b'a'..=b'h')) => {
            matches!(notation[end], b'K' | b'Q' | b'R' | b'B' | b'N' | b'P').then_some(end)
        }
        _ => None,
    }
}

fn play_null(before: &Chess, mode: CastlingMode) -> Result<Chess, SanError> {
    let mut setup = before.clone().into_setup(EnPassantMode::Legal);
    if setup.turn == Color::Black {
        setup.fullmoves = setup.fullmoves.saturating_add(1);
    }
    setup.turn = !setup.turn;
    setup.ep_square = None;
    setup.halfmoves = setup.halfmoves.saturating_add(1);
    Chess::from_setup(setup, mode).map_err(|_| SanError::IllegalSan)
}

#[cfg(test)]
mod tests {
    use shakmaty::fen::Fen;

    use super::*;

    fn fen(pos: &Chess) -> String {
        Fen::from_setup(setup_of(pos)).to_string()
    }

    fn position(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .expect("valid fen")
            .into_position(CastlingMode::Standard)
            .expect("legal position")
    }

    #[test]
    fn test_play() {
        let node = Node::play(&Chess::default(), "e4", CastlingMode::Standard).expect("legal");
        assert_eq!(node.san().to_string(), "e4");
        assert_eq!(node.turn(), Color::White);
        assert_eq!(node.fullmoves().get(), 1);
        assert_eq!(node.position().turn(), Color::Black);
        assert!(!node.is_null());

        let reply = Node::play(node.position(), "e5", CastlingMode::Standard).expect("legal");
        assert_eq!(reply.turn(), Color::Black);
        assert_eq!(reply.fullmoves().get(), 1);
        assert_eq!(reply.position().fullmoves().get(), 2);
    }

    #[test]
    fn test_illegal_and_ambiguous() {
        let start = Chess::default();
        assert_eq!(
            Node::play(&start, "e5", CastlingMode::Standard).expect_err("illegal"),
            SanError::IllegalSan
        );
        assert_eq!(
            Node::play(&start, "Zz9", CastlingMode::Standard).expect_err("garbage"),
            SanError::IllegalSan
        );

        let pos = position("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1");
        assert_eq!(
            Node::play(&pos, "Nd2", CastlingMode::Standard).expect_err("ambiguous"),
            SanError::AmbiguousSan
        );
        assert!(Node::play(&pos, "Nbd2", CastlingMode::Standard).is_ok());
    }

    #[test]
    fn test_canonical_san() {
        let pos = position("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let node = Node::play(&pos, "Ra8", CastlingMode::Standard).expect("legal");
        assert_eq!(node.san().to_string(), "Ra8+");
    }

    #[test]
    fn test_promotion_without_equals() {
        let pos = position("8/4P1k1/8/8/8/8/8/4K3 w - - 0 1");
        let node = Node::play(&pos, "e8Q", CastlingMode::Standard).expect("legal");
        assert_eq!(node.san().to_string(), "e8=Q");

        assert_eq!(promotion_without_equals(b"e8Q"), Some(2));
        assert_eq!(promotion_without_equals(b"dxe8N+"), Some(4));
        assert_eq!(promotion_without_equals(b"e8=Q"), None);
        assert_eq!(promotion_without_equals(b"Qe8"), None);
        assert_eq!(promotion_without_equals(b"e4"), None);
    }

    #[test]
    fn test_null_move() {
        let pos = Chess::default();
        let white = Node::play(&pos, "--", CastlingMode::Standard).expect("legal null move");
        assert!(white.is_null());
        assert_eq!(white.san().to_string(), "--");
        assert_eq!(
            fen(white.position()),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 1 1"
        );

        let black = Node::play(white.position(), "--", CastlingMode::Standard).expect("legal");
        assert_eq!(black.turn(), Color::Black);
        assert_eq!(black.position().fullmoves().get(), 2);

        let in_check = position("3k4/8/8/8/8/8/8/3RK3 b - - 0 1");
        assert_eq!(
            Node::play(&in_check, "--", CastlingMode::Standard).expect_err("in check"),
            SanError::IllegalSan
        );
    }

    #[test]
    fn test_annotations() {
        let mut annotations = Annotations::default();
        assert!(annotations.is_empty());

        annotations.add_nag(Nag(3));
        annotations.add_nag(Nag(3));
        annotations.add_nag(Nag(1));
        assert_eq!(annotations.nags().iter().copied().collect::<Vec<_>>(), [Nag(1), Nag(3)]);

        annotations.set_comment(Some("first".to_owned()), true);
        assert!(annotations.is_long_comment());
        annotations.set_comment(None, true);
        assert_eq!(annotations.comment(), None);
        assert!(!annotations.is_long_comment());

        annotations.set_tag("clk".to_owned(), "0:01".to_owned());
        annotations.set_tag("clk".to_owned(), "0:02".to_owned());
        assert_eq!(annotations.tag("clk"), Some("0:02"));
        assert_eq!(annotations.tags().len(), 1);
    }

    #[test]
    fn test_variation_positions() {
        let mut variation = Variation::new(Chess::default(), false);
        let e4 =
            Node::play(variation.final_position(), "e4", CastlingMode::Standard).expect("legal");
        variation.nodes_mut().push(e4);
        let e5 =
            Node::play(variation.final_position(), "e5", CastlingMode::Standard).expect("legal");
        variation.nodes_mut().push(e5);

        assert_eq!(variation.len(), 2);
        assert_eq!(fen(variation.position_before(0)), fen(&Chess::default()));
        assert_eq!(
            fen(variation.position_before(1)),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(
            variation.iter().map(|node| node.san().to_string()).collect::<Vec<_>>(),
            ["e4", "e5"]
        );
    }
}
