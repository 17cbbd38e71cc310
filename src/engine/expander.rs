// ==========================================
// Shopify 商品批量导入生成系统 - 变体展开器
// ==========================================
// 职责: 三个规格维度的笛卡尔积展开（维度一为主序）
// 红线: 组合数上限 300,超限拒绝该商品,绝不截断
// ==========================================

use crate::domain::product::{OptionDimension, VariantCombo};
use crate::engine::broadcaster::split_pipe;
use crate::sheet::{columns, SheetRow};

/// 单商品变体组合数上限
pub const MAX_VARIANTS: usize = 300;

/// 组合数超限（拒绝该商品,其余商品继续处理）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantOverflow {
    pub count: usize,
}

// ==========================================
// VariantGrid - 展开后的变体网格
// ==========================================
#[derive(Debug, Clone)]
pub struct VariantGrid {
    pub dim1_name: String,
    pub dim2_name: String,
    pub dim3_name: String,
    /// 维度一取值（折叠后,供按后缀列解析对齐）
    pub dim1_values: Vec<String>,
    pub n1: usize,
    pub n2: usize,
    pub n3: usize,
    pub combos: Vec<VariantCombo>,
}

impl VariantGrid {
    pub fn variant_count(&self) -> usize {
        self.combos.len()
    }
}

/// 从输入行解析三个规格维度
///
/// 约定:
/// - 维度一名称缺省为 "Title";取值为空折叠为单值 "Default Title"
/// - 维度二/三仅当名称与取值均非空才参与组合,否则贡献单个空值
pub fn resolve_dimensions(row: &SheetRow) -> [OptionDimension; 3] {
    let mut dim1_name = row.get(columns::OPTION1_NAME).to_string();
    if dim1_name.is_empty() {
        dim1_name = "Title".to_string();
    }
    let mut dim1_values = split_pipe(row.get(columns::OPTION1_VALUES));
    if dim1_values.is_empty() {
        dim1_values = vec!["Default Title".to_string()];
    }

    [
        OptionDimension::new(dim1_name, dim1_values),
        OptionDimension::new(
            row.get(columns::OPTION2_NAME),
            split_pipe(row.get(columns::OPTION2_VALUES)),
        ),
        OptionDimension::new(
            row.get(columns::OPTION3_NAME),
            split_pipe(row.get(columns::OPTION3_VALUES)),
        ),
    ]
}

/// 笛卡尔积展开（dim1 外层,dim3 内层,顺序全序且确定）
pub fn expand(dims: &[OptionDimension; 3]) -> Result<VariantGrid, VariantOverflow> {
    let [dim1, dim2, dim3] = dims;

    let empty = vec![String::new()];
    let list1 = &dim1.values;
    let list2 = if dim2.is_active() { &dim2.values } else { &empty };
    let list3 = if dim3.is_active() { &dim3.values } else { &empty };

    let (n1, n2, n3) = (list1.len(), list2.len(), list3.len());
    let total = n1 * n2 * n3;
    if total > MAX_VARIANTS {
        return Err(VariantOverflow { count: total });
    }

    let mut combos = Vec::with_capacity(total);
    for v1 in list1 {
        for v2 in list2 {
            for v3 in list3 {
                combos.push(VariantCombo {
                    option1: v1.clone(),
                    option2: v2.clone(),
                    option3: v3.clone(),
                });
            }
        }
    }

    Ok(VariantGrid {
        dim1_name: dim1.name.clone(),
        dim2_name: dim2.name.clone(),
        dim3_name: dim3.name.clone(),
        dim1_values: list1.clone(),
        n1,
        n2,
        n3,
        combos,
    })
}
