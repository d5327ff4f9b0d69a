// crates/nk_foundation/src/field.rs

//! 平面网格与二维场
//!
//! 本层只提供最小的存储抽象：规则网格上按行主序排列的标量场与掩码。
//! 分布式存储、插值到网格等属于外部协作者。

use serde::{Deserialize, Serialize};

use crate::error::{NkError, NkResult};

/// 规则平面网格
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// x 方向点数
    pub nx: usize,
    /// y 方向点数
    pub ny: usize,
    /// x 方向间距 [m]
    pub dx: f64,
    /// y 方向间距 [m]
    pub dy: f64,
}

impl Grid {
    /// 创建网格
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64) -> Self {
        Self { nx, ny, dx, dy }
    }

    /// 网格点总数
    #[inline]
    pub fn n_points(&self) -> usize {
        self.nx * self.ny
    }

    /// 行主序线性索引
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        j * self.nx + i
    }

    /// 最小间距
    pub fn min_spacing(&self) -> f64 {
        self.dx.min(self.dy)
    }

    /// 四邻点（越界的邻点被省略）
    pub fn neighbors(&self, i: usize, j: usize) -> impl Iterator<Item = (usize, usize)> {
        let (nx, ny) = (self.nx, self.ny);
        let candidates = [
            (i.checked_add(1).filter(|&x| x < nx), Some(j)),
            (i.checked_sub(1), Some(j)),
            (Some(i), j.checked_add(1).filter(|&y| y < ny)),
            (Some(i), j.checked_sub(1)),
        ];
        candidates
            .into_iter()
            .filter_map(|(a, b)| Some((a?, b?)))
    }
}

/// 二维标量场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarField {
    nx: usize,
    ny: usize,
    data: Vec<f64>,
}

impl ScalarField {
    /// 创建填充常数的场
    pub fn constant(grid: &Grid, value: f64) -> Self {
        Self {
            nx: grid.nx,
            ny: grid.ny,
            data: vec![value; grid.n_points()],
        }
    }

    /// 创建零场
    pub fn zeros(grid: &Grid) -> Self {
        Self::constant(grid, 0.0)
    }

    /// 从行主序数据创建
    pub fn from_vec(grid: &Grid, data: Vec<f64>) -> NkResult<Self> {
        NkError::check_size("ScalarField", grid.n_points(), data.len())?;
        Ok(Self {
            nx: grid.nx,
            ny: grid.ny,
            data,
        })
    }

    /// 点数
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 形状 (nx, ny)
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// 是否与网格形状一致
    pub fn matches(&self, grid: &Grid) -> bool {
        self.nx == grid.nx && self.ny == grid.ny
    }

    /// 读取 (i, j) 处的值
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[j * self.nx + i]
    }

    /// 设置 (i, j) 处的值
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[j * self.nx + i] = value;
    }

    /// 只读数据切片
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// 可变数据切片
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// 整体赋值
    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// self += alpha * other
    pub fn add_scaled(&mut self, alpha: f64, other: &ScalarField) -> NkResult<()> {
        NkError::check_size("ScalarField::add_scaled", self.len(), other.len())?;
        for (dst, src) in self.data.iter_mut().zip(&other.data) {
            *dst += alpha * src;
        }
        Ok(())
    }

    /// 最大绝对值
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}

/// 单元类型（对应掩码值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    /// 无冰陆地
    #[default]
    IceFreeLand,
    /// 无冰海洋
    IceFreeOcean,
    /// 接地冰
    GroundedIce,
    /// 浮冰
    FloatingIce,
}

impl CellType {
    /// 是否有冰
    #[inline]
    pub fn is_icy(self) -> bool {
        matches!(self, Self::GroundedIce | Self::FloatingIce)
    }
}

/// 单元类型掩码
#[derive(Debug, Clone, PartialEq)]
pub struct CellTypeMask {
    grid: Grid,
    cells: Vec<CellType>,
}

impl CellTypeMask {
    /// 创建统一类型的掩码
    pub fn uniform(grid: Grid, cell: CellType) -> Self {
        Self {
            cells: vec![cell; grid.n_points()],
            grid,
        }
    }

    /// 网格
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// 读取单元类型
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> CellType {
        self.cells[self.grid.index(i, j)]
    }

    /// 设置单元类型
    pub fn set(&mut self, i: usize, j: usize, cell: CellType) {
        let idx = self.grid.index(i, j);
        self.cells[idx] = cell;
    }

    /// 无冰海洋且与冰相邻（冰崩前缘）
    pub fn is_ice_front(&self, i: usize, j: usize) -> bool {
        self.get(i, j) == CellType::IceFreeOcean
            && self.grid.neighbors(i, j).any(|(a, b)| self.get(a, b).is_icy())
    }
}

/// 边界条件掩码（true 表示厚度由边界条件给定）
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryMask {
    nx: usize,
    flags: Vec<bool>,
}

impl BoundaryMask {
    /// 全部为 false 的掩码
    pub fn empty(grid: &Grid) -> Self {
        Self {
            nx: grid.nx,
            flags: vec![false; grid.n_points()],
        }
    }

    /// 读取
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.flags[j * self.nx + i]
    }

    /// 设置
    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        self.flags[j * self.nx + i] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(3, 2, 1000.0, 2000.0)
    }

    #[test]
    fn test_field_from_vec_size_check() {
        let g = grid();
        assert!(ScalarField::from_vec(&g, vec![0.0; 6]).is_ok());
        assert!(ScalarField::from_vec(&g, vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_add_scaled_and_max_abs() {
        let g = grid();
        let mut a = ScalarField::constant(&g, 1.0);
        let mut b = ScalarField::zeros(&g);
        b.set(2, 1, -4.0);
        a.add_scaled(2.0, &b).unwrap();
        assert!((a.get(2, 1) + 7.0).abs() < 1e-12);
        assert!((a.max_abs() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_neighbors_at_corner() {
        let g = grid();
        let n: Vec<_> = g.neighbors(0, 0).collect();
        assert_eq!(n.len(), 2);
        assert!(n.contains(&(1, 0)));
        assert!(n.contains(&(0, 1)));
    }

    #[test]
    fn test_ice_front_detection() {
        let g = grid();
        let mut mask = CellTypeMask::uniform(g, CellType::IceFreeOcean);
        mask.set(0, 0, CellType::FloatingIce);
        assert!(mask.is_ice_front(1, 0));
        assert!(!mask.is_ice_front(2, 1));
        assert!(!mask.is_ice_front(0, 0));
    }
}
