use anyhow::{anyhow, bail, Context};
use std::collections::VecDeque;
use std::fs;

// Up, down, left, right, stay.
const DIRECTIONS: [(isize, isize); 5] = [(-1, 0), (1, 0), (0, -1), (0, 1), (0, 0)];

#[derive(Debug, Clone)]
pub struct Tile {
    passable: bool,
    pub neighbors: Vec<(usize, usize)>, // Stores coordinates of accessible neighbors, self included
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        self.passable
    }
}

#[derive(Debug, Clone)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    pub grid: Vec<Vec<Tile>>,
}

impl Map {
    /// Reads a MovingAI `.map` file: `type`, `height`, `width` and `map`
    /// header lines followed by the rows, `.` marking free cells.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("failed to read map {path}"))?;
        Self::parse(&content).with_context(|| format!("malformed map file {path}"))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut lines = content.lines().map(str::trim_end);

        let _type = lines.next().ok_or_else(|| anyhow!("missing type line"))?;
        let height = parse_header(lines.next(), "height")?;
        let width = parse_header(lines.next(), "width")?;
        match lines.next() {
            Some("map") => {}
            other => bail!("expected `map` line, got {other:?}"),
        }

        let rows: Vec<&str> = lines.take(height).collect();
        if rows.len() != height {
            bail!("expected {height} rows, got {}", rows.len());
        }
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.chars().count() < width)
        {
            bail!("row {index} is shorter than width {width}: {row:?}");
        }

        let rows: Vec<String> = rows
            .iter()
            .map(|row| row.chars().take(width).collect())
            .collect();
        Self::from_rows(&rows)
    }

    /// Builds a map from in-memory rows, `.` marking free cells.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> anyhow::Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
        if height == 0 || width == 0 {
            bail!("map must have at least one row and one column");
        }

        let mut grid = Vec::with_capacity(height);
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                bail!("row {index} has {} cells, expected {width}", row.chars().count());
            }
            let tiles_row: Vec<Tile> = row
                .chars()
                .map(|ch| Tile {
                    passable: ch == '.',
                    neighbors: Vec::new(),
                })
                .collect();
            grid.push(tiles_row);
        }

        let mut map = Map {
            height,
            width,
            grid,
        };
        let tables: Vec<Vec<Vec<(usize, usize)>>> = (0..height)
            .map(|x| (0..width).map(|y| map.successors((x, y))).collect())
            .collect();
        for (tiles_row, table_row) in map.grid.iter_mut().zip(tables) {
            for (tile, neighbors) in tiles_row.iter_mut().zip(table_row) {
                tile.neighbors = neighbors;
            }
        }
        Ok(map)
    }

    /// Free cells one move away from `position` in `DIRECTIONS` order, the
    /// cell itself last. Blocked cells have no successors.
    fn successors(&self, position: (usize, usize)) -> Vec<(usize, usize)> {
        if !self.is_passable(position.0, position.1) {
            return Vec::new();
        }
        DIRECTIONS
            .iter()
            .filter_map(|&(dx, dy)| {
                let next = (
                    position.0.checked_add_signed(dx)?,
                    position.1.checked_add_signed(dy)?,
                );
                (self.in_bounds(next) && self.is_passable(next.0, next.1)).then_some(next)
            })
            .collect()
    }

    /// Precomputed successors of `position`; empty for blocked cells.
    pub fn neighbors(&self, position: (usize, usize)) -> &[(usize, usize)] {
        &self.grid[position.0][position.1].neighbors
    }

    pub fn in_bounds(&self, position: (usize, usize)) -> bool {
        position.0 < self.height && position.1 < self.width
    }

    pub fn is_passable(&self, x: usize, y: usize) -> bool {
        self.grid[x][y].is_passable()
    }

    pub fn free_cells(&self) -> Vec<(usize, usize)> {
        (0..self.height)
            .flat_map(|x| (0..self.width).map(move |y| (x, y)))
            .filter(|&(x, y)| self.is_passable(x, y))
            .collect()
    }

    /// Whether `goal` is connected to `start` when time and other agents are
    /// ignored. Breadth-first, stopping at the first sight of `goal`.
    pub fn is_reachable(&self, start: (usize, usize), goal: (usize, usize)) -> bool {
        if start == goal {
            return true;
        }

        let mut visited = vec![vec![false; self.width]; self.height];
        let mut frontier = VecDeque::from([start]);
        visited[start.0][start.1] = true;

        while let Some(position) = frontier.pop_front() {
            for &next in self.neighbors(position) {
                if next == goal {
                    return true;
                }
                if !visited[next.0][next.1] {
                    visited[next.0][next.1] = true;
                    frontier.push_back(next);
                }
            }
        }

        false
    }
}

fn parse_header(line: Option<&str>, key: &str) -> anyhow::Result<usize> {
    let line = line.ok_or_else(|| anyhow!("missing {key} line"))?;
    let mut parts = line.split_whitespace();
    if parts.next() != Some(key) {
        bail!("expected `{key} <n>`, got {line:?}");
    }
    parts
        .next()
        .ok_or_else(|| anyhow!("missing value in {line:?}"))?
        .parse::<usize>()
        .with_context(|| format!("invalid {key} in {line:?}"))
}
