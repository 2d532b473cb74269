use std::path::Path;
use std::{env, io};

use rand_core::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

pub fn default_gen() -> impl RngCore {
    Xoshiro256PlusPlus::seed_from_u64(0x5EED_0F_4E57_2E11_u64)
}

mod zobrist {
    use std::io::{self, BufWriter, Write};
    use std::{fs, path::Path};

    use kestrel_base::types::PieceCode;
    use rand_core::RngCore;

    struct Zobrist {
        pieces: [[u64; 64]; PieceCode::COUNT],
        side: u64,
        castle: [u64; 4],
        ep_file: [u64; 8],
    }

    impl Zobrist {
        fn generate<R: RngCore>(gen: &mut R) -> Zobrist {
            let mut pieces = [[0_u64; 64]; PieceCode::COUNT];
            for sub in &mut pieces {
                for x in sub {
                    *x = gen.next_u64();
                }
            }
            Zobrist {
                pieces,
                side: gen.next_u64(),
                castle: [(); 4].map(|_| gen.next_u64()),
                ep_file: [(); 8].map(|_| gen.next_u64()),
            }
        }

        fn generate_default() -> Zobrist {
            Self::generate(&mut super::default_gen())
        }

        fn output<W: Write>(&self, w: &mut W) -> io::Result<()> {
            writeln!(w, "const PIECES: [[u64; 64]; PieceCode::COUNT] = [")?;
            for (i, sub) in self.pieces.iter().enumerate() {
                writeln!(w, "    /*{:2}*/ [", i)?;
                for (i, hsh) in sub.iter().enumerate() {
                    writeln!(w, "        /*{:2}*/ {:#x},", i, hsh)?;
                }
                writeln!(w, "    ],")?;
            }
            writeln!(w, "];\n")?;

            writeln!(w, "pub const SIDE: u64 = {:#x};\n", self.side)?;

            writeln!(w, "const CASTLE: [u64; 4] = [")?;
            for (i, hsh) in self.castle.iter().enumerate() {
                writeln!(w, "    /*{}*/ {:#x},", i, hsh)?;
            }
            writeln!(w, "];\n")?;

            writeln!(w, "const EP_FILE: [u64; 8] = [")?;
            for (i, hsh) in self.ep_file.iter().enumerate() {
                writeln!(w, "    /*{}*/ {:#x},", i, hsh)?;
            }
            writeln!(w, "];")?;

            Ok(())
        }
    }

    pub fn gen(out_path: &Path) -> io::Result<()> {
        Zobrist::generate_default().output(&mut BufWriter::new(&fs::File::create(out_path)?))?;
        Ok(())
    }
}

mod near_attacks {
    use std::io::{self, BufWriter, Write};
    use std::{fs, path::Path};

    use kestrel_base::bitboard::Bitboard;
    use kestrel_base::types::Coord;

    fn generate_directed<const N: usize>(d_file: [isize; N], d_rank: [isize; N]) -> [Bitboard; 64] {
        let mut res = [Bitboard::EMPTY; 64];
        for c in Coord::iter() {
            let mut bb = Bitboard::EMPTY;
            for (&delta_file, &delta_rank) in d_file.iter().zip(d_rank.iter()) {
                if let Some(nc) = c.shift(delta_file, delta_rank) {
                    bb.set(nc);
                }
            }
            res[c.index()] = bb;
        }
        res
    }

    fn print_bitboards<W: Write>(w: &mut W, name: &str, bs: &[Bitboard; 64]) -> io::Result<()> {
        writeln!(w, "const {}: [Bitboard; 64] = [", name)?;
        for (i, b) in bs.iter().enumerate() {
            writeln!(w, "    /*{:2}*/ bb(0x{:016x}),", i, b.as_raw())?;
        }
        writeln!(w, "];")?;
        Ok(())
    }

    pub fn gen(out_path: &Path) -> io::Result<()> {
        let f = fs::File::create(out_path)?;
        let mut w = BufWriter::new(&f);

        print_bitboards(
            &mut w,
            "KING_ATTACKS",
            &generate_directed([-1, -1, -1, 0, 0, 1, 1, 1], [-1, 0, 1, -1, 1, -1, 0, 1]),
        )?;
        writeln!(&mut w)?;
        print_bitboards(
            &mut w,
            "KNIGHT_ATTACKS",
            &generate_directed([-2, -2, -1, -1, 2, 2, 1, 1], [-1, 1, -2, 2, -1, 1, -2, 2]),
        )?;
        writeln!(&mut w)?;
        print_bitboards(
            &mut w,
            "WHITE_PAWN_ATTACKS",
            &generate_directed([-1, 1], [-1, -1]),
        )?;
        writeln!(&mut w)?;
        print_bitboards(
            &mut w,
            "BLACK_PAWN_ATTACKS",
            &generate_directed([-1, 1], [1, 1]),
        )?;

        Ok(())
    }
}

mod rays {
    use std::io::{self, BufWriter, Write};
    use std::{fs, path::Path};

    use kestrel_base::bitboard::Bitboard;
    use kestrel_base::dir::Dir;
    use kestrel_base::types::Coord;

    /// Sentinel in `DIRECTION` for squares that don't share a line
    const NO_DIR: u8 = 0xff;

    fn ray(c: Coord, dir: Dir) -> Bitboard {
        let mut res = Bitboard::EMPTY;
        let mut p = c;
        while let Some(np) = dir.next(p) {
            res.set(np);
            p = np;
        }
        res
    }

    pub fn gen(out_path: &Path) -> io::Result<()> {
        let f = fs::File::create(out_path)?;
        let mut w = BufWriter::new(&f);

        writeln!(w, "static RAYS: [[Bitboard; 64]; Dir::COUNT] = [")?;
        for dir in Dir::iter() {
            writeln!(w, "    /*{:?}*/ [", dir)?;
            for c in Coord::iter() {
                writeln!(w, "        /*{:2}*/ bb(0x{:016x}),", c.index(), ray(c, dir).as_raw())?;
            }
            writeln!(w, "    ],")?;
        }
        writeln!(w, "];\n")?;

        let mut direction = [[NO_DIR; 64]; 64];
        for src in Coord::iter() {
            for dir in Dir::iter() {
                for dst in ray(src, dir) {
                    direction[src.index()][dst.index()] = dir as u8;
                }
            }
        }
        writeln!(w, "const NO_DIR: u8 = {:#x};\n", NO_DIR)?;
        writeln!(w, "static DIRECTION: [[u8; 64]; 64] = [")?;
        for (i, row) in direction.iter().enumerate() {
            write!(w, "    /*{:2}*/ [", i)?;
            for (j, d) in row.iter().enumerate() {
                if j != 0 {
                    write!(w, ", ")?;
                }
                write!(w, "{:#x}", d)?;
            }
            writeln!(w, "],")?;
        }
        writeln!(w, "];")?;

        Ok(())
    }
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = env::var("OUT_DIR").map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    zobrist::gen(&Path::new(&out_dir).join("zobrist.rs"))?;
    near_attacks::gen(&Path::new(&out_dir).join("near_attacks.rs"))?;
    rays::gen(&Path::new(&out_dir).join("rays.rs"))?;

    Ok(())
}
