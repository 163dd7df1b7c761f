//! Transaction steps, in the order they run.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Pending,
    OpenDetail,
    WaitImage,
    ExtractHash,
    LocateMenu,
    LocateDownloadAction,
    TriggerDownload,
    MeasureSize,
    Discard,
    Commit,
    ReturnToBoard,
    Done,
}
