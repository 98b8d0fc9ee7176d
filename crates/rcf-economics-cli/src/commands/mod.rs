pub mod rcf;
