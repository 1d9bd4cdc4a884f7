use openingtree_core::{EngineError, MoveEngine, MoveKey, Ply, Promotion, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Black,
}

impl Color {
    fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    color: Color,
    role: Role,
}

impl Piece {
    fn fen_char(&self) -> char {
        let c = match self.role {
            Role::Pawn => 'p',
            Role::Knight => 'n',
            Role::Bishop => 'b',
            Role::Rook => 'r',
            Role::Queen => 'q',
            Role::King => 'k',
        };
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

const BACK_RANK: [Role; 8] = [
    Role::Rook,
    Role::Knight,
    Role::Bishop,
    Role::Queen,
    Role::King,
    Role::Bishop,
    Role::Knight,
    Role::Rook,
];

/// Castling rights in FEN order: white king side, white queen side, black king side, black queen side.
const CASTLING_CORNERS: [(usize, char); 4] = [(7, 'K'), (0, 'Q'), (63, 'k'), (56, 'q')];

const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
const ROOK_RAYS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_RAYS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// How a legal move is carried out on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveKind {
    Normal,
    DoublePush,
    EnPassant,
    Castle { rook_from: Square, rook_to: Square },
}

/// Board state needed to check legality and emit FEN after every ply.
#[derive(Debug, Clone)]
struct Board {
    squares: [Option<Piece>; 64],
    turn: Color,
    castling: [bool; 4],
    en_passant: Option<Square>,
    halfmove: u32,
    fullmove: u32,
}

impl Board {
    fn initial() -> Self {
        let mut squares = [None; 64];
        for (file, role) in BACK_RANK.iter().enumerate() {
            squares[file] = Some(Piece {
                color: Color::White,
                role: *role,
            });
            squares[8 + file] = Some(Piece {
                color: Color::White,
                role: Role::Pawn,
            });
            squares[48 + file] = Some(Piece {
                color: Color::Black,
                role: Role::Pawn,
            });
            squares[56 + file] = Some(Piece {
                color: Color::Black,
                role: *role,
            });
        }

        Board {
            squares,
            turn: Color::White,
            castling: [true; 4],
            en_passant: None,
            halfmove: 0,
            fullmove: 1,
        }
    }

    fn fen(&self) -> String {
        let mut fen = String::with_capacity(90);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.squares[rank * 8 + file] {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push_str(match self.turn {
            Color::White => " w ",
            Color::Black => " b ",
        });

        let rights: String = CASTLING_CORNERS
            .iter()
            .zip(self.castling)
            .filter(|(_, allowed)| *allowed)
            .map(|((_, c), _)| *c)
            .collect();
        fen.push_str(if rights.is_empty() { "-" } else { rights.as_str() });

        match self.en_passant {
            Some(square) => fen.push_str(&format!(" {square}")),
            None => fen.push_str(" -"),
        }
        fen.push_str(&format!(" {} {}", self.halfmove, self.fullmove));
        fen
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    fn holds(&self, square: Option<Square>, color: Color, roles: &[Role]) -> bool {
        square
            .and_then(|square| self.piece_at(square))
            .is_some_and(|piece| piece.color == color && roles.contains(&piece.role))
    }

    /// First piece met walking from `from` (exclusive) along `ray`.
    fn first_on_ray(&self, from: Square, (df, dr): (i8, i8)) -> Option<Piece> {
        let mut current = from;
        while let Some(next) = shift(current, df, dr) {
            if let Some(piece) = self.piece_at(next) {
                return Some(piece);
            }
            current = next;
        }
        None
    }

    fn is_attacked(&self, square: Square, by: Color) -> bool {
        let pawn_rank = match by {
            Color::White => -1,
            Color::Black => 1,
        };
        let slider = |rays: &[(i8, i8)], role: Role| {
            rays.iter().any(|&ray| {
                self.first_on_ray(square, ray).is_some_and(|piece| {
                    piece.color == by && (piece.role == role || piece.role == Role::Queen)
                })
            })
        };

        [-1, 1]
            .iter()
            .any(|&df| self.holds(shift(square, df, pawn_rank), by, &[Role::Pawn]))
            || KNIGHT_JUMPS
                .iter()
                .any(|&(df, dr)| self.holds(shift(square, df, dr), by, &[Role::Knight]))
            || KING_STEPS
                .iter()
                .any(|&(df, dr)| self.holds(shift(square, df, dr), by, &[Role::King]))
            || slider(&ROOK_RAYS[..], Role::Rook)
            || slider(&BISHOP_RAYS[..], Role::Bishop)
    }

    fn in_check(&self, color: Color) -> bool {
        self.squares
            .iter()
            .position(|piece| *piece == Some(Piece { color, role: Role::King }))
            .and_then(|idx| Square::try_from(idx).ok())
            .is_some_and(|king| self.is_attacked(king, color.opponent()))
    }

    /// True when every square strictly between `origin` and `dest` on a line is empty.
    fn path_clear(&self, origin: Square, dest: Square) -> bool {
        let df = (dest.file() as i8 - origin.file() as i8).signum();
        let dr = (dest.rank() as i8 - origin.rank() as i8).signum();
        let mut current = origin;
        while let Some(next) = shift(current, df, dr) {
            if next == dest {
                return true;
            }
            if self.piece_at(next).is_some() {
                return false;
            }
            current = next;
        }
        false
    }

    /// Check how the side to move could play `key`, ignoring king safety.
    fn classify(&self, key: MoveKey) -> Result<MoveKind, String> {
        let origin = key.origin();
        let dest = key.dest();
        let piece = self
            .piece_at(origin)
            .ok_or_else(|| format!("no piece on {origin}"))?;
        if piece.color != self.turn {
            return Err(format!("{origin} does not hold a piece of the side to move"));
        }
        let target = self.piece_at(dest);
        if origin == dest || target.is_some_and(|target| target.color == self.turn) {
            return Err(format!("{key} lands on an own piece"));
        }

        let (forward, start_rank, last_rank) = match self.turn {
            Color::White => (1, 1, 7),
            Color::Black => (-1, 6, 0),
        };
        let promotes = piece.role == Role::Pawn && dest.rank() == last_rank;
        match (promotes, key.promotion()) {
            (true, None) => return Err(format!("pawn reaching {dest} needs a promotion piece")),
            (false, Some(_)) => return Err(format!("{key} cannot promote")),
            _ => {}
        }

        let df = dest.file() as i8 - origin.file() as i8;
        let dr = dest.rank() as i8 - origin.rank() as i8;
        let straight = (df == 0) != (dr == 0);
        let diagonal = df.abs() == dr.abs();

        let kind = match piece.role {
            Role::Pawn => {
                if df == 0 && dr == forward && target.is_none() {
                    Some(MoveKind::Normal)
                } else if df == 0
                    && dr == 2 * forward
                    && origin.rank() == start_rank
                    && target.is_none()
                    && self.path_clear(origin, dest)
                {
                    Some(MoveKind::DoublePush)
                } else if df.abs() == 1 && dr == forward && target.is_some() {
                    Some(MoveKind::Normal)
                } else if df.abs() == 1 && dr == forward && self.en_passant == Some(dest) {
                    Some(MoveKind::EnPassant)
                } else {
                    None
                }
            }
            Role::Knight => {
                matches!((df.abs(), dr.abs()), (1, 2) | (2, 1)).then_some(MoveKind::Normal)
            }
            Role::Bishop => (diagonal && self.path_clear(origin, dest)).then_some(MoveKind::Normal),
            Role::Rook => (straight && self.path_clear(origin, dest)).then_some(MoveKind::Normal),
            Role::Queen => {
                ((straight || diagonal) && self.path_clear(origin, dest)).then_some(MoveKind::Normal)
            }
            Role::King if df.abs() <= 1 && dr.abs() <= 1 => Some(MoveKind::Normal),
            Role::King if dr == 0 && df.abs() == 2 => Some(self.castling(origin, df > 0)?),
            Role::King => None,
        };

        kind.ok_or_else(|| format!("{key} is not a legal move"))
    }

    fn castling(&self, origin: Square, king_side: bool) -> Result<MoveKind, String> {
        let (home, right) = match (self.turn, king_side) {
            (Color::White, true) => (0, 0),
            (Color::White, false) => (0, 1),
            (Color::Black, true) => (7, 2),
            (Color::Black, false) => (7, 3),
        };
        if origin.file() != 4 || origin.rank() != home || !self.castling[right] {
            return Err(format!("castling from {origin} is no longer allowed"));
        }

        let (rook_file, rook_dest_file, step) = if king_side { (7, 5, 1) } else { (0, 3, -1) };
        let rook_from = Square::new(rook_file, home)
            .ok_or_else(|| format!("no castling rook for {origin}"))?;
        let rook_to = Square::new(rook_dest_file, home)
            .ok_or_else(|| format!("no castling rook for {origin}"))?;
        if !self.holds(Some(rook_from), self.turn, &[Role::Rook]) {
            return Err(format!("no rook on {rook_from} to castle with"));
        }
        if !self.path_clear(origin, rook_from) {
            return Err(format!("pieces stand between the king and {rook_from}"));
        }

        let enemy = self.turn.opponent();
        let passes_attack = [0, step, 2 * step]
            .iter()
            .filter_map(|&df| shift(origin, df, 0))
            .any(|square| self.is_attacked(square, enemy));
        if passes_attack {
            return Err("the king castles out of or through check".to_string());
        }

        Ok(MoveKind::Castle { rook_from, rook_to })
    }

    /// Board after `key`, rejecting moves that leave the mover's king attacked.
    fn after(&self, key: MoveKey) -> Result<Board, String> {
        let kind = self.classify(key)?;
        let mut next = self.clone();
        next.apply(key, kind);
        if next.in_check(self.turn) {
            return Err(format!("{key} leaves the king in check"));
        }
        Ok(next)
    }

    /// Legal moves of `role` for the side to move that land on `dest`.
    fn candidates(&self, role: Role, dest: Square, promotion: Option<Promotion>) -> Vec<MoveKey> {
        (0..64usize)
            .filter_map(|idx| Square::try_from(idx).ok())
            .filter(|origin| self.holds(Some(*origin), self.turn, &[role]))
            .map(|origin| MoveKey::new(origin, dest, promotion))
            .filter(|key| self.after(*key).is_ok())
            .collect()
    }

    /// Play a legal move and return its SAN label, without check suffixes.
    fn play(&mut self, key: MoveKey) -> Result<String, String> {
        let next = self.after(key)?;
        let label = self.label(key)?;
        *self = next;
        Ok(label)
    }

    fn label(&self, key: MoveKey) -> Result<String, String> {
        let origin = key.origin();
        let dest = key.dest();
        let kind = self.classify(key)?;
        let piece = self
            .piece_at(origin)
            .ok_or_else(|| format!("no piece on {origin}"))?;

        if let MoveKind::Castle { rook_from, .. } = kind {
            let label = if rook_from.file() > origin.file() { "O-O" } else { "O-O-O" };
            return Ok(label.to_string());
        }

        let capture = self.piece_at(dest).is_some() || kind == MoveKind::EnPassant;
        let mut label = String::new();
        if piece.role == Role::Pawn {
            if capture {
                label.push((b'a' + origin.file()) as char);
            }
        } else {
            label.push(Piece { color: Color::White, role: piece.role }.fen_char());
            let rivals: Vec<Square> = self
                .candidates(piece.role, dest, None)
                .into_iter()
                .map(|rival| rival.origin())
                .filter(|rival| *rival != origin)
                .collect();
            if !rivals.is_empty() {
                let file = (b'a' + origin.file()) as char;
                let rank = (b'1' + origin.rank()) as char;
                if rivals.iter().all(|rival| rival.file() != origin.file()) {
                    label.push(file);
                } else if rivals.iter().all(|rival| rival.rank() != origin.rank()) {
                    label.push(rank);
                } else {
                    label.push(file);
                    label.push(rank);
                }
            }
        }
        if capture {
            label.push('x');
        }
        label.push_str(&dest.to_string());
        if let Some(promotion) = key.promotion() {
            label.push('=');
            label.push(promotion.as_char().to_ascii_uppercase());
        }
        Ok(label)
    }

    /// Resolve a SAN token such as `Nbd2`, `exd5`, `e8=Q+` or `O-O` against the legal moves.
    fn parse_san(&self, token: &str) -> Result<MoveKey, String> {
        let san = token.trim_end_matches(['+', '#', '!', '?']);
        let home = match self.turn {
            Color::White => 0,
            Color::Black => 7,
        };
        let castle_file = match san {
            "O-O" | "0-0" => Some(6),
            "O-O-O" | "0-0-0" => Some(2),
            _ => None,
        };
        if let Some(file) = castle_file {
            let origin = Square::new(4, home).ok_or_else(|| format!("cannot castle in {token}"))?;
            let dest = Square::new(file, home).ok_or_else(|| format!("cannot castle in {token}"))?;
            return Ok(MoveKey::new(origin, dest, None));
        }

        let (body, promotion) = match san.split_once('=') {
            Some((body, piece)) => {
                let mut chars = piece.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => (
                        body,
                        Some(
                            Promotion::from_char(c.to_ascii_lowercase())
                                .ok_or_else(|| format!("invalid promotion in '{token}'"))?,
                        ),
                    ),
                    _ => return Err(format!("invalid promotion in '{token}'")),
                }
            }
            None => (san, None),
        };

        let mut chars: Vec<char> = body.chars().filter(|c| *c != 'x').collect();
        let role = match chars.first() {
            Some('N') => Role::Knight,
            Some('B') => Role::Bishop,
            Some('R') => Role::Rook,
            Some('Q') => Role::Queen,
            Some('K') => Role::King,
            _ => Role::Pawn,
        };
        if role != Role::Pawn {
            chars.remove(0);
        }
        if chars.len() < 2 {
            return Err(format!("invalid move '{token}'"));
        }

        let split = chars.len() - 2;
        let dest: Square = chars[split..]
            .iter()
            .collect::<String>()
            .parse()
            .map_err(|_| format!("invalid move '{token}'"))?;
        let mut file_hint = None;
        let mut rank_hint = None;
        for &c in &chars[..split] {
            match c {
                'a'..='h' => file_hint = Some(c as u8 - b'a'),
                '1'..='8' => rank_hint = Some(c as u8 - b'1'),
                _ => return Err(format!("invalid move '{token}'")),
            }
        }

        let matching: Vec<MoveKey> = self
            .candidates(role, dest, promotion)
            .into_iter()
            .filter(|key| file_hint.is_none_or(|file| key.origin().file() == file))
            .filter(|key| rank_hint.is_none_or(|rank| key.origin().rank() == rank))
            .collect();
        match matching.as_slice() {
            [key] => Ok(*key),
            [] => Err(format!("{token} is not a legal move")),
            _ => Err(format!("{token} is ambiguous")),
        }
    }

    /// Move the pieces and update rights and counters. `key` must have been classified as `kind`.
    fn apply(&mut self, key: MoveKey, kind: MoveKind) {
        let origin = key.origin();
        let dest = key.dest();
        let Some(piece) = self.piece_at(origin) else {
            return;
        };
        let capture = self.piece_at(dest).is_some() || kind == MoveKind::EnPassant;

        match kind {
            MoveKind::EnPassant => {
                if let Some(captured) = Square::new(dest.file(), origin.rank()) {
                    self.squares[captured.index()] = None;
                }
            }
            MoveKind::Castle { rook_from, rook_to } => {
                self.squares[rook_to.index()] = self.squares[rook_from.index()].take();
            }
            MoveKind::Normal | MoveKind::DoublePush => {}
        }

        self.squares[origin.index()] = None;
        self.squares[dest.index()] = Some(match key.promotion() {
            Some(promotion) => Piece {
                color: piece.color,
                role: promoted_role(promotion),
            },
            None => piece,
        });

        self.update_castling(piece, origin, dest);
        self.en_passant = match kind {
            MoveKind::DoublePush => Square::new(origin.file(), (origin.rank() + dest.rank()) / 2),
            _ => None,
        };
        if piece.role == Role::Pawn || capture {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }
        if self.turn == Color::Black {
            self.fullmove += 1;
        }
        self.turn = self.turn.opponent();
    }

    fn update_castling(&mut self, piece: Piece, origin: Square, dest: Square) {
        if piece.role == Role::King {
            let lost = match piece.color {
                Color::White => [0, 1],
                Color::Black => [2, 3],
            };
            for idx in lost {
                self.castling[idx] = false;
            }
        }
        for (idx, (corner, _)) in CASTLING_CORNERS.iter().enumerate() {
            if origin.index() == *corner || dest.index() == *corner {
                self.castling[idx] = false;
            }
        }
    }
}

/// Step `square` by a file and rank offset, `None` when it leaves the board.
fn shift(square: Square, df: i8, dr: i8) -> Option<Square> {
    let file = square.file() as i8 + df;
    let rank = square.rank() as i8 + dr;
    if !(0..8).contains(&file) || !(0..8).contains(&rank) {
        return None;
    }
    Square::new(file as u8, rank as u8)
}

fn promoted_role(promotion: Promotion) -> Role {
    match promotion {
        Promotion::Knight => Role::Knight,
        Promotion::Bishop => Role::Bishop,
        Promotion::Rook => Role::Rook,
        Promotion::Queen => Role::Queen,
    }
}

/// Move engine for standard chess from the initial position.
///
/// Accepts coordinate moves (`e2e4`, `e7e8q`) and SAN (`e4`, `Nbd2`, `exd5`,
/// `O-O`, `e8=Q+`), mixed freely. Move numbers (`1.`, `12...`) are ignored and
/// a result token (`1-0`, `0-1`, `1/2-1/2`, `*`) ends the game. Every move is
/// checked for legality, king safety and castling rights included; the first
/// illegal one fails the replay. Labels are SAN with disambiguation but no
/// check suffixes, and position keys are FEN.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateEngine;

impl MoveEngine for CoordinateEngine {
    fn replay(&self, notation: &str, limit: usize) -> Result<Vec<Ply>, EngineError> {
        let mut board = Board::initial();
        let mut plies = Vec::new();

        for token in notation.split_whitespace() {
            if plies.len() >= limit {
                break;
            }
            if matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*") {
                break;
            }
            let token = token.rsplit('.').next().unwrap_or(token);
            if token.is_empty() {
                continue;
            }

            let ply_index = plies.len();
            let move_key = match token.parse::<MoveKey>() {
                Ok(move_key) => move_key,
                Err(_) => board
                    .parse_san(token)
                    .map_err(|reason| EngineError { ply_index, reason })?,
            };
            let san = board
                .play(move_key)
                .map_err(|reason| EngineError { ply_index, reason })?;

            plies.push(Ply {
                move_key,
                san,
                position_key: board.fen(),
            });
        }

        Ok(plies)
    }
}
