pub mod ai_service;
pub mod attempt_service;
pub mod candidate_service;
pub mod code_runner;
pub mod coding_stage;
pub mod grading_service;
pub mod mcq_stage;
pub mod media_service;
pub mod resume_service;
pub mod speech_service;
pub mod stage;
pub mod storage_service;
pub mod video_stage;
