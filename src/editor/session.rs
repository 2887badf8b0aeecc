use crate::error::{EditorError, ValidationError};
use crate::models::{
    DetailLine, DocumentHeader, DocumentId, DocumentPayload, LineCandidate, OrderAggregate,
};
use serde::Serialize;

/// 编辑指针：追加模式或正在编辑某一行
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "index", rename_all = "snake_case")]
pub enum EditMode {
    #[default]
    Appending,
    Editing(usize),
}

/// 单据编辑会话
/// 明细行、编辑指针、录入表单都只属于本会话，提交前不落库
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    document_id: Option<DocumentId>,
    header: DocumentHeader,
    lines: Vec<DetailLine>,
    mode: EditMode,
    form: LineCandidate,
    /// 提交请求进行中，防止重复创建单据
    submitting: bool,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 打开已保存的单据继续编辑
    /// 载入的每一行都重新校验，小计在本地重算
    pub fn load_document(
        id: DocumentId,
        header: DocumentHeader,
        lines: Vec<DetailLine>,
    ) -> Result<Self, EditorError> {
        let lines = lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| {
                line.revalidated()
                    .map_err(|source| EditorError::InvalidLine { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            document_id: Some(id),
            header,
            lines,
            ..Self::default()
        })
    }

    pub fn document_id(&self) -> Option<DocumentId> {
        self.document_id
    }

    pub fn header(&self) -> &DocumentHeader {
        &self.header
    }

    pub fn set_header(&mut self, header: DocumentHeader) {
        self.header = header;
    }

    pub fn lines(&self) -> &[DetailLine] {
        &self.lines
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn form(&self) -> &LineCandidate {
        &self.form
    }

    /// 录入过程中同步表单，只检查数值范围
    pub fn set_form(&mut self, form: LineCandidate) -> Result<(), EditorError> {
        form.check_bounds()?;
        self.form = form;
        Ok(())
    }

    pub fn aggregate(&self) -> OrderAggregate {
        OrderAggregate::from_lines(&self.lines)
    }

    /// 追加明细，成功后清空表单
    pub fn add_line(&mut self, candidate: LineCandidate) -> Result<usize, EditorError> {
        if let Err(e) = candidate.validate() {
            return Err(self.reject(candidate, e));
        }

        self.lines.push(DetailLine::from_candidate(None, candidate));
        self.form = LineCandidate::default();
        Ok(self.lines.len() - 1)
    }

    /// 原位更新明细，保留已持久化的ID，并回到追加模式
    pub fn update_line(
        &mut self,
        index: usize,
        candidate: LineCandidate,
    ) -> Result<(), EditorError> {
        let len = self.lines.len();
        if index >= len {
            return Err(EditorError::IndexOutOfRange { index, len });
        }

        if let Err(e) = candidate.validate() {
            return Err(self.reject(candidate, e));
        }

        let slot = &mut self.lines[index];
        *slot = DetailLine::from_candidate(slot.id, candidate);
        self.mode = EditMode::Appending;
        self.form = LineCandidate::default();
        Ok(())
    }

    /// 被拒绝的值留在表单中，超出列范围的除外
    fn reject(&mut self, candidate: LineCandidate, error: ValidationError) -> EditorError {
        if candidate.check_bounds().is_ok() {
            self.form = candidate;
        }
        error.into()
    }

    /// 删除明细并修正编辑指针，使其仍指向同一逻辑行
    pub fn delete_line(&mut self, index: usize) -> Result<DetailLine, EditorError> {
        if index >= self.lines.len() {
            return Err(EditorError::IndexOutOfRange {
                index,
                len: self.lines.len(),
            });
        }

        let removed = self.lines.remove(index);
        if let EditMode::Editing(current) = self.mode {
            if current == index {
                self.mode = EditMode::Appending;
                self.form = LineCandidate::default();
            } else if current > index {
                self.mode = EditMode::Editing(current - 1);
            }
        }
        Ok(removed)
    }

    /// 进入编辑模式，用该行当前值预填表单
    pub fn begin_edit(&mut self, index: usize) -> Result<&LineCandidate, EditorError> {
        let Some(line) = self.lines.get(index) else {
            return Err(EditorError::IndexOutOfRange {
                index,
                len: self.lines.len(),
            });
        };

        self.form = line.to_candidate();
        self.mode = EditMode::Editing(index);
        Ok(&self.form)
    }

    pub fn cancel_edit(&mut self) {
        self.mode = EditMode::Appending;
        self.form = LineCandidate::default();
    }

    /// 保存按钮：编辑模式下原位更新，否则追加
    pub fn save(&mut self, candidate: LineCandidate) -> Result<usize, EditorError> {
        match self.mode {
            EditMode::Editing(index) => self.update_line(index, candidate).map(|_| index),
            EditMode::Appending => self.add_line(candidate),
        }
    }

    /// 关闭会话/新建单据时丢弃所有状态
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 组装提交给适配器的单据
    pub fn payload(&self) -> DocumentPayload {
        DocumentPayload {
            header: self.header.clone(),
            lines: self.lines.clone(),
            aggregate: self.aggregate(),
        }
    }

    /// 提交成功后记录单据ID，后续提交走更新
    pub fn mark_saved(&mut self, id: DocumentId) {
        self.document_id = Some(id);
    }

    /// 占用提交槽位；已有提交进行中时返回 false
    pub fn begin_submit(&mut self) -> bool {
        !std::mem::replace(&mut self.submitting, true)
    }

    pub fn end_submit(&mut self) {
        self.submitting = false;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }
}
